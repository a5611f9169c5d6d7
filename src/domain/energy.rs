// Energy categories (energiesoort), subtypes (soort) and the user's category selection
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Stroom,
    Gas,
}

impl Category {
    pub const ALL: [Category; 2] = [Category::Stroom, Category::Gas];

    pub fn code(&self) -> &'static str {
        match self {
            Category::Stroom => "stroom",
            Category::Gas => "gas",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Category::Stroom => "Stroom",
            Category::Gas => "Gas",
        }
    }

    pub fn unit_label(&self) -> &'static str {
        match self {
            Category::Stroom => "kWh",
            Category::Gas => "m\u{00B3}",
        }
    }

    pub fn color(&self) -> &'static str {
        match self {
            Category::Stroom => "#4575B3",
            Category::Gas => "#BA2924",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "stroom" => Ok(Category::Stroom),
            "gas" => Ok(Category::Gas),
            other => Err(format!("onbekende energiesoort: {}", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Subtype {
    #[default]
    Verbruik,
    Kosten,
}

impl Subtype {
    pub const ALL: [Subtype; 2] = [Subtype::Verbruik, Subtype::Kosten];

    pub fn code(&self) -> &'static str {
        match self {
            Subtype::Verbruik => "verbruik",
            Subtype::Kosten => "kosten",
        }
    }

    /// Column name of this subtype for a category, e.g. `gas-kosten`.
    pub fn column(&self, category: Category) -> String {
        format!("{}-{}", category.code(), self.code())
    }
}

impl FromStr for Subtype {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "verbruik" => Ok(Subtype::Verbruik),
            "kosten" => Ok(Subtype::Kosten),
            other => Err(format!("onbekende soort: {}", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionMode {
    Single,
    Multiple,
}

/// Ordered set of selected categories.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategorySelection {
    mode: SelectionMode,
    categories: Vec<Category>,
}

impl CategorySelection {
    pub fn new(mode: SelectionMode, categories: Vec<Category>) -> Self {
        let mut selection = Self {
            mode,
            categories: Vec::new(),
        };
        for category in categories {
            if !selection.categories.contains(&category) {
                selection.categories.push(category);
            }
        }
        if mode == SelectionMode::Single {
            selection.categories.truncate(1);
        }
        selection
    }

    /// Costs can be stacked across categories, consumption cannot
    /// (kWh and m³ don't add up).
    pub fn for_subtype(subtype: Subtype) -> Self {
        match subtype {
            Subtype::Kosten => Self::new(SelectionMode::Multiple, Category::ALL.to_vec()),
            Subtype::Verbruik => Self::new(SelectionMode::Single, vec![Category::Stroom]),
        }
    }

    pub fn categories(&self) -> &[Category] {
        &self.categories
    }

    /// Returns whether the selection changed.
    pub fn toggle(&mut self, category: Category) -> bool {
        match self.mode {
            SelectionMode::Multiple => {
                if let Some(index) = self.categories.iter().position(|c| *c == category) {
                    self.categories.remove(index);
                } else {
                    self.categories.push(category);
                }
                true
            }
            SelectionMode::Single => {
                if self.categories.first() == Some(&category) {
                    false
                } else {
                    self.categories = vec![category];
                    true
                }
            }
        }
    }
}
