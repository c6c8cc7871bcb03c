use comfy_table::{Cell, Table};

use penny::categorizer::CategoryTable;
use penny::error::Result;
use penny::settings::load_settings;

fn category_table() -> CategoryTable {
    CategoryTable::with_extra_keywords(&load_settings().extra_keywords)
}

pub fn run(description: &str, amount: Option<f64>) -> Result<()> {
    let category = category_table().classify(description, amount);
    println!("{description} \u{2192} {category}");
    Ok(())
}

pub fn list() -> Result<()> {
    let mut table = Table::new();
    table.set_header(vec!["#", "Category", "Keywords"]);
    for (i, rule) in category_table().rules().iter().enumerate() {
        table.add_row(vec![
            Cell::new(i + 1),
            Cell::new(rule.category.name()),
            Cell::new(rule.keywords.join(", ")),
        ]);
    }
    println!("Category Rules (first match wins)\n{table}");
    Ok(())
}
