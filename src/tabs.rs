use crate::weather::{CurrentSlot, WeatherSnapshot};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Tab {
    #[default]
    Current,
    NextTwoDays,
    Week,
}

impl Tab {
    pub const ALL: [Tab; 3] = [Tab::Current, Tab::NextTwoDays, Tab::Week];

    pub fn index(self) -> usize {
        match self {
            Tab::Current => 0,
            Tab::NextTwoDays => 1,
            Tab::Week => 2,
        }
    }

    pub fn from_index(index: usize) -> Option<Tab> {
        Self::ALL.get(index).copied()
    }

    pub fn label(self) -> &'static str {
        match self {
            Tab::Current => "Current Weather",
            Tab::NextTwoDays => "Next Two Days",
            Tab::Week => "Week-long Forecast",
        }
    }

    /// Stays on the last tab.
    pub fn next(self) -> Tab {
        Self::from_index(self.index() + 1).unwrap_or(self)
    }

    /// Stays on the first tab.
    pub fn previous(self) -> Tab {
        self.index()
            .checked_sub(1)
            .and_then(Self::from_index)
            .unwrap_or(self)
    }
}

/// One card to render: the snapshot plus its optional heading.
#[derive(Debug, Clone, PartialEq)]
pub struct PanelCard<'a> {
    pub label: Option<String>,
    pub weather: &'a WeatherSnapshot,
}

pub fn day_label(position: usize) -> String {
    if position == 0 {
        "Today".to_string()
    } else {
        format!("Day: {}", position)
    }
}

/// Cards shown on `tab`. Unpopulated data yields no cards.
pub fn panel_cards<'a>(
    tab: Tab,
    current: &'a CurrentSlot,
    forecast: &'a [WeatherSnapshot],
) -> Vec<PanelCard<'a>> {
    match tab {
        Tab::Current => current
            .snapshot()
            .map(|weather| PanelCard {
                label: None,
                weather,
            })
            .into_iter()
            .collect(),
        // Positions 1 and 2; "today" is skipped and a short forecast
        // simply yields fewer cards.
        Tab::NextTwoDays => forecast
            .iter()
            .enumerate()
            .skip(1)
            .take(2)
            .map(|(position, weather)| PanelCard {
                label: Some(day_label(position)),
                weather,
            })
            .collect(),
        Tab::Week => forecast
            .iter()
            .enumerate()
            .map(|(position, weather)| PanelCard {
                label: Some(day_label(position)),
                weather,
            })
            .collect(),
    }
}
