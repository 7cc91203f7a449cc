use proptest::prelude::*;
use tienda_analytics::rules::{CategoryRule, DEFAULT_CATEGORY, RuleTable, category_of};

#[test]
fn queso_is_dairy_under_case_and_accent_variation() {
    let rules = RuleTable::builtin();
    for name in ["queso", "QUESO", "qUeSo", "Quéso", "  Queso rallado  "] {
        assert_eq!(category_of(name, &rules), "LÁCTEOS", "{name}");
    }
}

#[test]
fn builtin_table_resolves_common_products() {
    let rules = RuleTable::builtin();
    assert_eq!(rules.category_of("Leche entera"), "LÁCTEOS");
    assert_eq!(rules.category_of("Café molido"), "ALIMENTOS");
    assert_eq!(rules.category_of("Maní tostado"), "FRUTAS Y VERDURAS");
    assert_eq!(rules.category_of("Detergente líquido"), "LIMPIEZA");
    assert_eq!(rules.category_of("Vino tinto"), "BEBIDAS ALCOHÓLICAS");
    assert_eq!(rules.category_of("Tornillos"), DEFAULT_CATEGORY);
}

#[test]
fn earlier_rule_shadows_later_overlapping_keyword() {
    // "agua" precedes "sal": mineral water stays a drink.
    let rules = RuleTable::builtin();
    assert_eq!(rules.category_of("Agua con sal"), "BEBIDAS");
}

proptest! {
    #[test]
    fn categorization_is_total(name in any::<String>()) {
        let rules = RuleTable::builtin();
        let category = category_of(&name, &rules);
        prop_assert!(!category.is_empty());
    }

    #[test]
    fn categorization_is_total_for_arbitrary_tables(
        rules in prop::collection::vec(("\\PC{0,6}", "[A-Z]{1,8}"), 0..12),
        name in "\\PC{0,24}",
    ) {
        let table = RuleTable::new(
            rules.into_iter().map(|(k, c)| CategoryRule::new(k, c)).collect(),
            DEFAULT_CATEGORY,
        );
        let first = category_of(&name, &table);
        let second = category_of(&name, &table);
        prop_assert!(!first.is_empty());
        prop_assert_eq!(first, second);
    }

    #[test]
    fn queso_wins_wherever_it_appears(prefix in "[b-df-hj-np-tv-z ]{0,6}", suffix in "[b-df-hj-np-tv-z ]{0,6}") {
        let rules = RuleTable::builtin();
        let name = format!("{prefix}QuEsO{suffix}");
        prop_assume!(rules.rules().take_while(|r| r.keyword != "queso").all(|r| !name.to_lowercase().contains(&r.keyword)));
        prop_assert_eq!(rules.category_of(&name), "LÁCTEOS");
    }
}
