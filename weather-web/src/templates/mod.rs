mod layout;
mod weather_page;

pub use layout::base;
pub use weather_page::weather_page;
