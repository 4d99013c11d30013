use std::sync::Arc;

use axum::{
    Form,
    extract::{State, rejection::FormRejection},
    response::Html,
};
use log::{error, info};
use serde::Deserialize;
use weather_core::ViewModel;

use crate::{AppState, templates::weather_page};

#[derive(Debug, Deserialize)]
pub struct CityForm {
    pub city: String,
}

pub async fn index_handler() -> Html<String> {
    Html(weather_page(&ViewModel::blank()).into_string())
}

/// Malformed submissions render the page with the generic error, like any
/// other failed lookup.
pub async fn weather_handler(
    State(state): State<Arc<AppState>>,
    form: Result<Form<CityForm>, FormRejection>,
) -> Html<String> {
    let view = match form {
        Ok(Form(form)) => {
            info!("weather lookup for '{}'", form.city);
            state.handler.handle(&form.city).await
        }
        Err(rejection) => {
            error!("rejected weather form: {}", rejection.body_text());
            ViewModel::upstream_error()
        }
    };

    Html(weather_page(&view).into_string())
}
