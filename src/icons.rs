use crate::error::FetchError;
use crate::weather::WeatherSnapshot;
use iced::widget::image;
use std::collections::{HashMap, HashSet};

pub fn icon_url(base_url: &str, icon: &str) -> String {
    format!("{}{}@2x.png", base_url, icon)
}

pub async fn fetch_icon(http: reqwest::Client, url: String) -> Result<Vec<u8>, FetchError> {
    let response = http.get(&url).send().await?.error_for_status()?;
    let bytes = response.bytes().await?;
    Ok(bytes.to_vec())
}

/// Downloaded icon images keyed by icon code.
#[derive(Debug, Default)]
pub struct IconStore {
    handles: HashMap<String, image::Handle>,
    requested: HashSet<String>,
}

impl IconStore {
    pub fn get(&self, icon: &str) -> Option<&image::Handle> {
        self.handles.get(icon)
    }

    /// Icon codes from `snapshots` never requested before. Marks them as
    /// requested, so each code is downloaded at most once.
    pub fn claim_missing<'a, I>(&mut self, snapshots: I) -> Vec<String>
    where
        I: IntoIterator<Item = &'a WeatherSnapshot>,
    {
        let mut missing = Vec::new();
        for snapshot in snapshots {
            if snapshot.icon.is_empty() {
                continue;
            }
            if self.requested.insert(snapshot.icon.clone()) {
                missing.push(snapshot.icon.clone());
            }
        }
        missing
    }

    pub fn insert(&mut self, icon: String, bytes: Vec<u8>) {
        self.handles.insert(icon, image::Handle::from_memory(bytes));
    }
}
