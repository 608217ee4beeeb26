use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// Reserved dish meaning "ad-hoc / not from the pool".
const OTHER_DISH: &str = "other";
/// Any dish carrying this prefix is an ad-hoc dish too, e.g. `other:pizza`.
const OTHER_PREFIX: &str = "other:";

pub fn is_other(dish: &str) -> bool {
    dish == OTHER_DISH || dish.starts_with(OTHER_PREFIX)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Category {
    A,
    B,
    C,
}

impl Category {
    pub const ALL: [Category; 3] = [Category::A, Category::B, Category::C];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::A => "A",
            Category::B => "B",
            Category::C => "C",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Ordered dish lists, one per category. Duplicates are allowed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pool {
    #[serde(rename = "A", default)]
    pub a: Vec<String>,
    #[serde(rename = "B", default)]
    pub b: Vec<String>,
    #[serde(rename = "C", default)]
    pub c: Vec<String>,
}

impl Pool {
    pub fn new<S: Into<String>>(
        a: impl IntoIterator<Item = S>,
        b: impl IntoIterator<Item = S>,
        c: impl IntoIterator<Item = S>,
    ) -> Self {
        Self {
            a: a.into_iter().map(Into::into).collect(),
            b: b.into_iter().map(Into::into).collect(),
            c: c.into_iter().map(Into::into).collect(),
        }
    }

    pub fn get(&self, category: Category) -> &[String] {
        match category {
            Category::A => &self.a,
            Category::B => &self.b,
            Category::C => &self.c,
        }
    }

    pub fn get_mut(&mut self, category: Category) -> &mut Vec<String> {
        match category {
            Category::A => &mut self.a,
            Category::B => &mut self.b,
            Category::C => &mut self.c,
        }
    }

    /// Removes the first occurrence of `dish`. Missing dishes are a no-op.
    pub fn remove_one(&mut self, category: Category, dish: &str) -> bool {
        let list = self.get_mut(category);
        match list.iter().position(|d| d == dish) {
            Some(idx) => {
                list.remove(idx);
                true
            }
            None => false,
        }
    }

    pub fn sizes(&self) -> PoolSizes {
        PoolSizes {
            a: self.a.len(),
            b: self.b.len(),
            c: self.c.len(),
        }
    }

    /// Rejects pools that could never be drawn from or that carry ad-hoc dishes.
    pub fn validate(&self) -> Result<(), AppError> {
        for category in Category::ALL {
            let dishes = self.get(category);
            if dishes.is_empty() {
                return Err(AppError::validation(format!(
                    "pool {category} must contain at least one dish"
                )));
            }
            if dishes.iter().any(|d| d.trim().is_empty()) {
                return Err(AppError::validation(format!(
                    "pool {category} contains a blank dish"
                )));
            }
            if let Some(d) = dishes.iter().find(|d| is_other(d)) {
                return Err(AppError::validation(format!(
                    "pool {category} contains reserved dish '{d}'"
                )));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PoolSizes {
    #[serde(rename = "A")]
    pub a: usize,
    #[serde(rename = "B")]
    pub b: usize,
    #[serde(rename = "C")]
    pub c: usize,
}

/// The three dishes of one day, one per category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MealSet {
    #[serde(rename = "A")]
    pub a: String,
    #[serde(rename = "B")]
    pub b: String,
    #[serde(rename = "C")]
    pub c: String,
}

impl MealSet {
    pub fn new(a: impl Into<String>, b: impl Into<String>, c: impl Into<String>) -> Self {
        Self {
            a: a.into(),
            b: b.into(),
            c: c.into(),
        }
    }

    pub fn get(&self, category: Category) -> &str {
        match category {
            Category::A => &self.a,
            Category::B => &self.b,
            Category::C => &self.c,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (Category, &str)> {
        Category::ALL.into_iter().map(move |c| (c, self.get(c)))
    }

    pub fn validate(&self) -> Result<(), AppError> {
        for (category, dish) in self.iter() {
            if dish.trim().is_empty() {
                return Err(AppError::validation(format!("meal {category} is required")));
            }
        }
        Ok(())
    }
}
