use crate::app::Message;
use crate::tabs::{PanelCard, Tab};
use crate::weather::WeatherSnapshot;
use chrono::{DateTime, Local};
use iced::{
    theme,
    widget::{button, column, container, image, row, text, Row, Space},
    Alignment, Color, Element, Length,
};

/// Text content of a weather card.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CardText {
    pub description: String,
    pub high: String,
    pub current: String,
    pub low: String,
    pub humidity: String,
    pub wind: String,
}

impl CardText {
    pub fn new(weather: &WeatherSnapshot) -> Self {
        Self {
            description: weather.description.to_uppercase(),
            high: format!("High: {}°F", weather.temp_max),
            current: format!("Current: {}°F", weather.temp),
            low: format!("Low: {}°F", weather.temp_min),
            humidity: format!("Humidity: {}%", weather.humidity),
            wind: format!("Wind Speed: {} MPH", weather.wind_speed),
        }
    }
}

fn observed_date(observed_at: Option<DateTime<chrono::Utc>>) -> String {
    observed_at
        .map(|t| t.with_timezone(&Local).format("%a %m/%d").to_string())
        .unwrap_or_default()
}

fn value_badge<'a>(label: String) -> Element<'a, Message> {
    container(text(label).size(18))
        .padding([10, 16])
        .style(theme::Container::Box)
        .into()
}

pub fn create_weather_card<'a>(
    card: &PanelCard<'_>,
    icon: Option<&image::Handle>,
) -> Element<'a, Message> {
    let content = CardText::new(card.weather);

    // Day label and date
    let mut header = column![].spacing(4).align_items(Alignment::Center);
    if let Some(label) = &card.label {
        header = header.push(text(label.clone()).size(16));
    }
    let date = observed_date(card.weather.observed_at);
    if !date.is_empty() {
        header = header.push(
            text(date)
                .size(12)
                .style(Color::from_rgb(0.5, 0.5, 0.5)),
        );
    }

    // Icon, or a blank slot of the same size until it loads
    let icon_view: Element<Message> = match icon {
        Some(handle) => image(handle.clone())
            .width(Length::Fixed(100.0))
            .height(Length::Fixed(100.0))
            .into(),
        None => Space::with_height(Length::Fixed(100.0)).into(),
    };

    // High, current, low
    let temperatures = row![
        value_badge(content.high),
        value_badge(content.current),
        value_badge(content.low),
    ]
    .spacing(12);

    // Humidity and wind
    let conditions = row![value_badge(content.humidity), value_badge(content.wind)].spacing(12);

    container(
        column![
            header,
            icon_view,
            text(content.description).size(24),
            temperatures,
            conditions,
        ]
        .spacing(10)
        .align_items(Alignment::Center),
    )
    .padding(16)
    .style(theme::Container::Box)
    .width(Length::Fill)
    .center_x()
    .into()
}

pub fn create_tab_bar<'a>(selected: Tab) -> Element<'a, Message> {
    let tabs: Vec<Element<'a, Message>> = Tab::ALL
        .iter()
        .map(|&tab| {
            // Selected tab
            let style = if tab == selected {
                theme::Button::Primary
            } else {
                theme::Button::Secondary
            };

            button(
                text(tab.label())
                    .size(14)
                    .horizontal_alignment(iced::alignment::Horizontal::Center),
            )
            .on_press(Message::TabSelected(tab))
            .style(style)
            .padding([8, 16])
            .width(Length::Fill)
            .into()
        })
        .collect();

    Row::with_children(tabs).spacing(4).width(Length::Fill).into()
}
