use maud::{DOCTYPE, Markup, html};

pub fn base(title: &str, content: Markup) -> Markup {
    html! {
        (DOCTYPE)
        html lang="en" {
            head {
                meta charset="UTF-8";
                meta name="viewport" content="width=device-width, initial-scale=1.0";
                title { (title) }
                link rel="stylesheet" href="/static/styles.css";
            }
            body {
                main class="container" {
                    h1 class="title" { "Weather Forecast" }
                    (content)
                }
            }
        }
    }
}
