use std::collections::BTreeMap;

use crate::models::Category;

#[derive(Debug, Clone)]
pub struct CategoryRule {
    pub category: Category,
    pub keywords: Vec<String>,
}

impl CategoryRule {
    fn matches(&self, description: &str) -> bool {
        self.keywords.iter().any(|k| description.contains(k.as_str()))
    }
}

/// Ordered keyword rules. The first matching rule wins, so order is part of the contract.
#[derive(Debug, Clone)]
pub struct CategoryTable {
    rules: Vec<CategoryRule>,
}

const BUILTIN_RULES: &[(Category, &[&str])] = &[
    (Category::Transport, &["uber", "lyft", "bolt ride", "taxify", "transport", "fuel", "petrol", "parking", "toll"]),
    (Category::Groceries, &["groceries", "grocery", "supermarket", "walmart", "shoprite", "spar ", "market"]),
    (Category::Rent, &["rent", "landlord", "lease"]),
    (Category::Utilities, &["electricity", "nepa", "ekedc", "ikedc", "water bill", "dstv", "gotv", "internet", "utility"]),
    (Category::AirtimeData, &["airtime", "data bundle", "mtn", "glo ", "airtel", "9mobile", "recharge"]),
    (Category::Entertainment, &["spotify", "netflix", "hulu", "showmax", "cinema", "youtube", "apple music"]),
    (Category::FoodDining, &["restaurant", "cafe", "food", "eatery", "kfc", "domino", "pizza", "chowdeck"]),
    (Category::Health, &["pharmacy", "health", "hospital", "clinic", "medical"]),
    (Category::Shopping, &["amazon", "jumia", "konga", "store", "mall", "boutique"]),
    (Category::Education, &["school", "tuition", "university", "course", "udemy"]),
    (Category::BankCharges, &["sms alert", "charge", "commission", "vat ", "stamp duty", "maintenance fee"]),
    (Category::Transfers, &["transfer", "trf", "nip/", "ussd"]),
    (Category::Income, &["salary", "payroll", "wages", "dividend", "interest earned"]),
];

impl CategoryTable {
    pub fn new(rules: Vec<CategoryRule>) -> Self {
        let rules = rules
            .into_iter()
            .map(|r| CategoryRule {
                category: r.category,
                keywords: r.keywords.iter().map(|k| k.to_lowercase()).collect(),
            })
            .collect();
        Self { rules }
    }

    pub fn builtin() -> Self {
        Self::new(
            BUILTIN_RULES
                .iter()
                .map(|(category, keywords)| CategoryRule {
                    category: *category,
                    keywords: keywords.iter().map(|k| k.to_string()).collect(),
                })
                .collect(),
        )
    }

    /// Built-in rules with extra keywords appended to their categories.
    /// A category without a built-in rule gets a new rule at the end.
    pub fn with_extra_keywords(extra: &BTreeMap<Category, Vec<String>>) -> Self {
        let mut table = Self::builtin();
        for (category, keywords) in extra {
            let keywords = keywords.iter().map(|k| k.trim().to_lowercase()).filter(|k| !k.is_empty());
            match table.rules.iter_mut().find(|r| r.category == *category) {
                Some(rule) => rule.keywords.extend(keywords),
                None => table.rules.push(CategoryRule {
                    category: *category,
                    keywords: keywords.collect(),
                }),
            }
        }
        table
    }

    pub fn rules(&self) -> &[CategoryRule] {
        &self.rules
    }

    pub fn classify(&self, description: &str, amount: Option<f64>) -> Category {
        let desc = description.trim().to_lowercase();
        if let Some(rule) = self.rules.iter().find(|r| r.matches(&desc)) {
            return rule.category;
        }
        match amount {
            Some(a) if a > 0.0 => Category::Income,
            Some(_) => Category::MiscellaneousExpense,
            None => Category::Miscellaneous,
        }
    }
}

impl Default for CategoryTable {
    fn default() -> Self {
        Self::builtin()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keyword_match() {
        let table = CategoryTable::builtin();
        assert_eq!(table.classify("UBER *TRIP LAGOS", Some(-25.5)), Category::Transport);
        assert_eq!(table.classify("  Netflix.com  ", Some(-15.99)), Category::Entertainment);
        assert_eq!(table.classify("Restaurant Food", Some(-45.2)), Category::FoodDining);
        assert_eq!(table.classify("ACME PAYROLL", Some(5000.0)), Category::Income);
    }

    #[test]
    fn test_declaration_order_wins() {
        // "transport" and "food" both match; Transport is declared first.
        let table = CategoryTable::builtin();
        assert_eq!(table.classify("food transport allowance", Some(-10.0)), Category::Transport);
    }

    #[test]
    fn test_amount_sign_fallback() {
        let table = CategoryTable::builtin();
        assert_eq!(table.classify("XYZ LTD", Some(120.0)), Category::Income);
        assert_eq!(table.classify("XYZ LTD", Some(-120.0)), Category::MiscellaneousExpense);
        assert_eq!(table.classify("XYZ LTD", Some(0.0)), Category::MiscellaneousExpense);
        assert_eq!(table.classify("XYZ LTD", None), Category::Miscellaneous);
    }

    #[test]
    fn test_classification_is_deterministic() {
        let table = CategoryTable::builtin();
        let first = table.classify("POS SHOPRITE IKEJA", Some(-3200.0));
        for _ in 0..10 {
            assert_eq!(table.classify("POS SHOPRITE IKEJA", Some(-3200.0)), first);
        }
        assert_eq!(first, Category::Groceries);
    }

    #[test]
    fn test_extra_keywords_extend_rules() {
        let mut extra = BTreeMap::new();
        extra.insert(Category::Health, vec!["Gym".to_string(), "  ".to_string()]);
        let table = CategoryTable::with_extra_keywords(&extra);
        assert_eq!(table.classify("FITNESS GYM MONTHLY", Some(-50.0)), Category::Health);
        let health = table.rules().iter().find(|r| r.category == Category::Health).unwrap();
        assert!(health.keywords.contains(&"gym".to_string()));
        assert!(!health.keywords.iter().any(|k| k.is_empty()));
    }

    #[test]
    fn test_custom_table() {
        let table = CategoryTable::new(vec![CategoryRule {
            category: Category::Rent,
            keywords: vec!["HOUSING".to_string()],
        }]);
        assert_eq!(table.classify("housing co-op", Some(-900.0)), Category::Rent);
        assert_eq!(table.classify("uber", Some(-9.0)), Category::MiscellaneousExpense);
    }
}
