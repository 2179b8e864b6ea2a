use std::fmt;

use serde::{Deserialize, Serialize};

/// Logical light/dark selection carried by a figure description.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ThemeMode {
    #[default]
    Light,
    Dark,
}

impl ThemeMode {
    pub fn from_dark(dark: bool) -> Self {
        if dark {
            ThemeMode::Dark
        } else {
            ThemeMode::Light
        }
    }

    pub fn is_dark(self) -> bool {
        matches!(self, ThemeMode::Dark)
    }
}

/// A named widget theme, such as `light_minimal`.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Theme(String);

impl Theme {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn light_minimal() -> Self {
        Self::new("light_minimal")
    }

    pub fn dark_minimal() -> Self {
        Self::new("dark_minimal")
    }

    pub fn name(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The two themes a figure switches between.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ThemePair {
    pub light: Theme,
    pub dark: Theme,
}

impl ThemePair {
    pub fn new(light: Theme, dark: Theme) -> Self {
        Self { light, dark }
    }

    pub fn select(&self, dark: bool) -> &Theme {
        if dark {
            &self.dark
        } else {
            &self.light
        }
    }
}

impl Default for ThemePair {
    fn default() -> Self {
        Self::new(Theme::light_minimal(), Theme::dark_minimal())
    }
}
