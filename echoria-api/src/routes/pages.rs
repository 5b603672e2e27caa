//! Static-ish pages.

use axum::{extract::State, response::Html};
use echoria_storage::Ballot;

use crate::session::CurrentUser;

pub(crate) fn escape_html(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            other => out.push(other),
        }
    }
    out
}

fn layout(body: &str) -> Html<String> {
    Html(format!(
        "<!doctype html>\n<html lang=\"ru\"><head><meta charset=\"utf-8\">\
         <title>Echoria Awards</title></head><body>\n{}\n</body></html>",
        body
    ))
}

/// GET / - greeting plus the ballot form, or a login link.
pub async fn index(State(ballot): State<Ballot>, CurrentUser(user): CurrentUser) -> Html<String> {
    let Some(user) = user else {
        return layout(
            "<h1>🏆 Echoria Awards</h1>\n<p><a href=\"/login\">Войти через Discord</a></p>",
        );
    };

    let options: String = ballot
        .catalog()
        .names()
        .iter()
        .map(|name| {
            let name = escape_html(name);
            format!("<option value=\"{name}\">{name}</option>")
        })
        .collect();

    layout(&format!(
        "<h1>🏆 Echoria Awards</h1>\n\
         <p>Привет, {}! <a href=\"/logout\">Выйти</a></p>\n\
         <form method=\"post\" action=\"/vote\">\n\
         <select name=\"nomination\">{}</select>\n\
         <input name=\"choice\" maxlength=\"100\" required>\n\
         <button type=\"submit\">Голосовать</button>\n\
         </form>",
        escape_html(&user.username),
        options
    ))
}

/// GET /thanks
pub async fn thanks() -> Html<String> {
    layout("<h1>Спасибо!</h1>\n<p>Твой голос учтён.</p>\n<p><a href=\"/\">На главную</a></p>")
}

/// GET /health - liveness only.
pub async fn health() -> &'static str {
    "ok"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_html() {
        assert_eq!(
            escape_html("<b>\"Tom\" & 'Jerry'</b>"),
            "&lt;b&gt;&quot;Tom&quot; &amp; &#39;Jerry&#39;&lt;/b&gt;"
        );
        assert_eq!(escape_html("Тролль года"), "Тролль года");
    }
}
