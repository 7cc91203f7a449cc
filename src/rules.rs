//! Keyword-driven product categorization.
//!
//! A [`RuleTable`] is an ordered list of `(keyword, category)` pairs scanned
//! front to back; the first keyword contained in the folded product name
//! decides the category. Declaration order is part of the contract: `"te"`
//! sits after `"aceite"` and `"leche"` so those products are not filed as
//! infusions.

use log::warn;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::normalize::normalize;

pub const DEFAULT_CATEGORY: &str = "OTROS";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryRule {
    pub keyword: String,
    pub category: String,
}

impl CategoryRule {
    pub fn new(keyword: impl Into<String>, category: impl Into<String>) -> Self {
        Self {
            keyword: keyword.into(),
            category: category.into(),
        }
    }
}

#[derive(Debug, Clone)]
struct CompiledRule {
    needle: String,
    rule: CategoryRule,
}

#[derive(Debug, Clone)]
pub struct RuleTable {
    rules: Vec<CompiledRule>,
    default_category: String,
}

impl RuleTable {
    /// Compiles `rules` in the given order. Keywords that fold to an empty
    /// string would match every name and are dropped.
    pub fn new(rules: Vec<CategoryRule>, default_category: impl Into<String>) -> Self {
        let rules = rules
            .into_iter()
            .filter_map(|rule| {
                let needle = normalize(&rule.keyword);
                if needle.is_empty() {
                    warn!(
                        "Ignoring category rule with empty keyword (category '{}')",
                        rule.category
                    );
                    None
                } else {
                    Some(CompiledRule { needle, rule })
                }
            })
            .collect();
        Self {
            rules,
            default_category: default_category.into(),
        }
    }

    pub fn builtin() -> Self {
        Self::new(builtin_rules(), DEFAULT_CATEGORY)
    }

    /// Category for `product_name`; total, never fails.
    pub fn category_of(&self, product_name: &str) -> &str {
        let folded = normalize(product_name);
        self.rules
            .iter()
            .find(|compiled| folded.contains(&compiled.needle))
            .map(|compiled| compiled.rule.category.as_str())
            .unwrap_or(&self.default_category)
    }

    pub fn default_category(&self) -> &str {
        &self.default_category
    }

    pub fn rules(&self) -> impl Iterator<Item = &CategoryRule> {
        self.rules.iter().map(|compiled| &compiled.rule)
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Hex SHA-256 over the ordered rules and the default label. Reordering
    /// rules changes the fingerprint because it can change results.
    pub fn fingerprint(&self) -> String {
        let mut hasher = Sha256::new();
        for compiled in &self.rules {
            hasher.update(compiled.needle.as_bytes());
            hasher.update([0x1f]);
            hasher.update(compiled.rule.category.as_bytes());
            hasher.update([0x1e]);
        }
        hasher.update(self.default_category.as_bytes());
        format!("{:x}", hasher.finalize())
    }
}

impl Default for RuleTable {
    fn default() -> Self {
        Self::builtin()
    }
}

pub fn category_of(product_name: &str, rules: &RuleTable) -> String {
    rules.category_of(product_name).to_string()
}

const BEBIDAS: &str = "BEBIDAS";
const ALCOHOL: &str = "BEBIDAS ALCOHÓLICAS";
const LACTEOS: &str = "LÁCTEOS";
const SNACKS: &str = "SNACKS";
const LIMPIEZA: &str = "LIMPIEZA";
const CUIDADO: &str = "CUIDADO PERSONAL";
const CONGELADOS: &str = "CONGELADOS";
const GRANOS: &str = "GRANOS Y CEREALES";
const FRUTAS: &str = "FRUTAS Y VERDURAS";
const PANIFICADOS: &str = "PANIFICADOS";
const ALIMENTOS: &str = "ALIMENTOS";
const HOGAR: &str = "HOGAR";

pub fn builtin_rules() -> Vec<CategoryRule> {
    const RULES: &[(&str, &str)] = &[
        ("bebida", BEBIDAS),
        ("jugo", BEBIDAS),
        ("agua", BEBIDAS),
        ("cerveza", ALCOHOL),
        ("vino", ALCOHOL),
        ("whisky", ALCOHOL),
        ("ron", ALCOHOL),
        ("fernet", ALCOHOL),
        ("vodka", ALCOHOL),
        ("gin", ALCOHOL),
        ("sidra", ALCOHOL),
        ("queso", LACTEOS),
        ("yogur", LACTEOS),
        ("leche", LACTEOS),
        ("gallet", SNACKS),
        ("papas fritas", SNACKS),
        ("chocolate", SNACKS),
        ("chicle", SNACKS),
        ("turron", SNACKS),
        ("barrita", SNACKS),
        ("lavandina", LIMPIEZA),
        ("desengrasante", LIMPIEZA),
        ("limpiavidrios", LIMPIEZA),
        ("detergente", LIMPIEZA),
        ("shampoo", CUIDADO),
        ("desodorante", CUIDADO),
        ("crema dental", CUIDADO),
        ("cepillo", CUIDADO),
        ("hilo dental", CUIDADO),
        ("mascarilla", CUIDADO),
        ("pizza", CONGELADOS),
        ("hamburguesa", CONGELADOS),
        ("empanada", CONGELADOS),
        ("verduras congeladas", CONGELADOS),
        ("helado", CONGELADOS),
        ("arroz", GRANOS),
        ("fideos", GRANOS),
        ("lenteja", GRANOS),
        ("garbanzo", GRANOS),
        ("poroto", GRANOS),
        ("avena", GRANOS),
        ("granola", GRANOS),
        ("harina", GRANOS),
        ("azucar", GRANOS),
        ("sal", GRANOS),
        ("aceite", GRANOS),
        ("aceituna", FRUTAS),
        ("mermelada", FRUTAS),
        ("maní", FRUTAS),
        ("mix frutos", FRUTAS),
        ("miel", FRUTAS),
        ("pan", PANIFICADOS),
        ("medialuna", PANIFICADOS),
        ("yerba", ALIMENTOS),
        ("te", ALIMENTOS),
        ("cafe", ALIMENTOS),
        ("sopa", ALIMENTOS),
        ("caldo", ALIMENTOS),
        ("toalla húmeda", CUIDADO),
        ("trapo de piso", LIMPIEZA),
        ("servilleta", HOGAR),
        ("papel higienico", HOGAR),
        ("suavizante", LIMPIEZA),
        ("jabon", LIMPIEZA),
    ];
    RULES
        .iter()
        .map(|(keyword, category)| CategoryRule::new(*keyword, *category))
        .collect()
}
