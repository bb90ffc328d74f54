use crate::app::{Message, WeatherApp};
use crate::components;
use crate::tabs::panel_cards;
use iced::{
    theme,
    widget::{button, column, container, row, scrollable, text, text_input, Column},
    Alignment, Element, Font, Length,
};

pub fn view(app: &WeatherApp) -> Element<Message> {
    let title = text("Weatherlify").size(50);

    // Zip entry and weather tabs
    let postal_form = create_postal_form(app);
    let tabs = create_tabs_card(app);

    let mut content = column![title, postal_form, tabs]
        .spacing(16)
        .padding(16)
        .align_items(Alignment::Center);

    // Raw payloads below the cards
    if app.show_debug_json {
        content = content.push(create_debug_dump(app));
    }

    container(scrollable(content))
        .width(Length::Fill)
        .height(Length::Fill)
        .padding(10)
        .into()
}

fn create_postal_form(app: &WeatherApp) -> Element<Message> {
    let postal_input = text_input("Zip Code", &app.location.postal_code)
        .on_input(Message::PostalCodeChanged)
        .on_submit(Message::PostalCodeSubmitted)
        .padding(8)
        .size(14)
        .width(Length::Fixed(200.0));

    // Same action as pressing Enter in the input
    let apply_button = button(text("Apply Zip").size(14))
        .on_press(Message::PostalCodeSubmitted)
        .padding([8, 16])
        .style(theme::Button::Primary);

    row![postal_input, apply_button]
        .spacing(10)
        .align_items(Alignment::Center)
        .into()
}

fn create_tabs_card(app: &WeatherApp) -> Element<Message> {
    let cards = panel_cards(app.selected_tab, &app.current, &app.forecast);

    // Nothing to show renders an empty panel, loading or failed alike.
    let panel = Column::with_children(
        cards
            .iter()
            .map(|card| components::create_weather_card(card, app.icons.get(&card.weather.icon)))
            .collect::<Vec<_>>(),
    )
    .spacing(12)
    .padding(24)
    .width(Length::Fill)
    .align_items(Alignment::Center);

    // Tab bar above the panel
    container(column![components::create_tab_bar(app.selected_tab), panel].spacing(0))
        .style(theme::Container::Box)
        .width(Length::Fixed(720.0))
        .into()
}

fn create_debug_dump(app: &WeatherApp) -> Element<Message> {
    container(text(app.debug_json()).size(12).font(Font::MONOSPACE))
        .padding(16)
        .width(Length::Fixed(720.0))
        .into()
}
