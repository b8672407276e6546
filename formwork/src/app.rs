use std::sync::Arc;

use actix_web::http::Method;
use fw_auth::{
    auth_required, current_user, templates::LOGIN_TEMPLATE, CookieAuth, InMemoryUsers,
    PasswordAuth, User,
};
use fw_config::auth::AuthConfig;
use fw_error::{Error, Result};
use fw_forms::{
    conv::{Bool, Char, EnumChoice, Int},
    Field, FieldBlock, Form, Widget,
};
use fw_template::LiquidTemplates;
use fw_web::{cases, chain, endpoint, match_path, Chain, Data, Env, Response};

pub type Auth = CookieAuth<PasswordAuth<InMemoryUsers>>;

const PROFILE_TEMPLATE: &str = "profile";

const PROFILE: &str = r#"<!DOCTYPE html>
<html>
<head><title>Profile</title></head>
<body>
<p>Logged in as {{ user | escape }}</p>
<form method="post" action="{{ logout_url | escape }}"><button type="submit">Logout</button></form>
{% if saved %}<p class="saved">Saved</p><pre>{{ saved | escape }}</pre>{% endif %}
<form method="post" enctype="multipart/form-data">
{{ form }}
<button type="submit">Save</button>
</form>
</body>
</html>
"#;

pub fn templates() -> Result<LiquidTemplates> {
    let templates = LiquidTemplates::new()?;
    fw_forms::templates::register_defaults(&templates)?;
    fw_auth::templates::register_templates(&templates)?;
    templates.register(PROFILE_TEMPLATE, PROFILE)?;
    Ok(templates)
}

pub fn profile_form() -> Form {
    Form::new(vec![
        Field::new("name")
            .with_label("Name")
            .with_conv(Char::new().required().max_length(50))
            .into(),
        Field::new("age")
            .with_label("Age")
            .with_conv(Int::new().min(0).max(150))
            .into(),
        Field::new("color")
            .with_label("Favourite color")
            .with_conv(EnumChoice::new([
                ("red", "Red"),
                ("green", "Green"),
                ("blue", "Blue"),
            ]))
            .with_widget(Widget::select())
            .into(),
        Field::new("newsletter")
            .with_label("Subscribe to the newsletter")
            .with_conv(Bool::new())
            .with_widget(Widget::checkbox())
            .into(),
        Field::set(
            "address",
            vec![
                Field::new("city").with_label("City").into(),
                Field::new("street").with_label("Street").into(),
            ],
        )
        .with_label("Address")
        .into(),
        Field::list("phones", Field::new("phone").with_label("Phone"))
            .with_label("Phones")
            .into(),
        FieldBlock::new(
            "More about you",
            vec![
                Field::new("about")
                    .with_label("About")
                    .with_widget(Widget::textarea())
                    .into(),
                Field::file("avatar").with_label("Avatar").into(),
            ],
        )
        .closed()
        .opened_with_data()
        .into(),
    ])
    .with_id("profile")
}

fn profile_page(env: &mut Env, data: &mut Data, logout_url: &str) -> Result<Response> {
    let mut form = profile_form();
    let mut saved = None;

    if *env.request().method() == Method::POST && form.accept(env.request().post().clone()) {
        let python_data = serde_json::to_string_pretty(form.python_data())
            .map_err(|err| Error::InternalServerError(err.to_string()))?;
        saved = Some(python_data);
    }

    let user = current_user::<User>(env).map(|user| user.login().to_owned());
    data.insert("user", &user)?;
    data.insert("form", &form.render(env.templates())?)?;
    data.insert("saved", &saved)?;
    data.insert("logout_url", logout_url)?;
    env.render_to_response(PROFILE_TEMPLATE, data)
}

/// Session handling around login, logout and the protected profile page.
pub fn app(auth: &Arc<Auth>, config: &AuthConfig) -> Chain {
    let logout_url = config.logout_path().to_owned();

    chain().then(auth.clone()).then(
        cases()
            .case(auth.login(config.login_path(), LOGIN_TEMPLATE))
            .case(auth.logout(config.logout_path(), config.logout_redirect()))
            .case(
                chain()
                    .then(match_path("/"))
                    .then(auth_required(config.login_path()))
                    .then(endpoint(move |env, data| {
                        profile_page(env, data, &logout_url)
                    })),
            ),
    )
}

#[cfg(test)]
mod tests {
    use actix_web::http::StatusCode;
    use fw_auth::encrypt_password;
    use fw_forms::MultiDict;
    use fw_hash_argon2::argon2::Argon2Hash;
    use fw_web::{testing::ask, HandlerResult, Request};

    use super::*;

    struct Fixture {
        app: Chain,
        templates: Arc<LiquidTemplates>,
    }

    impl Fixture {
        fn new() -> Self {
            let hash = Arc::new(Argon2Hash::default());
            let users = InMemoryUsers::new();
            users
                .add("admin", &encrypt_password(&hash, "secret").unwrap())
                .unwrap();
            let auth = Arc::new(CookieAuth::new(PasswordAuth::new(users, hash)));

            Self {
                app: app(&auth, &AuthConfig::default()),
                templates: Arc::new(templates().unwrap()),
            }
        }

        fn ask(&self, request: Request) -> HandlerResult {
            ask(&self.app, request, self.templates.clone())
        }

        fn session(&self) -> String {
            let request = Request::blank("/login")
                .with_post(MultiDict::from_urlencoded("login=admin&password=secret"));
            let response = self.ask(request).unwrap().unwrap();
            assert_eq!(response.status(), StatusCode::SEE_OTHER);
            response.cookie("auth").unwrap().value().to_owned()
        }
    }

    #[test]
    fn profile_requires_login() {
        let fixture = Fixture::new();
        let response = fixture.ask(Request::blank("/")).unwrap().unwrap();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(response.location(), Some("/login?next=%2F"));
    }

    #[test]
    fn profile_renders_for_logged_in_user() {
        let fixture = Fixture::new();
        let key = fixture.session();
        let response = fixture
            .ask(Request::blank("/").with_cookie("auth", &key))
            .unwrap()
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.body().contains("Logged in as admin"));
        assert!(response.body().contains(r#"name="address.city""#));
        assert!(response.body().contains(r#"<div class="collapsable closed">"#));
        assert!(!response.body().contains("Saved"));
    }

    #[test]
    fn profile_shows_errors_and_saves() {
        let fixture = Fixture::new();
        let key = fixture.session();

        let request = Request::blank("/")
            .with_cookie("auth", &key)
            .with_post(MultiDict::from_urlencoded("name=&age=200"));
        let body = fixture.ask(request).unwrap().unwrap().body().to_owned();
        assert!(body.contains("required field"));
        assert!(body.contains("should be less than or equal to 150"));
        assert!(!body.contains("Saved"));

        let request = Request::blank("/").with_cookie("auth", &key).with_post(
            MultiDict::from_urlencoded(
                "name=Ann&age=30&color=green&address.city=Oslo&phones-indices=1&phones.1=555&about=hi",
            ),
        );
        let body = fixture.ask(request).unwrap().unwrap().body().to_owned();
        assert!(body.contains("Saved"));
        assert!(body.contains("Oslo"));
        assert!(body.contains(r#"<div class="collapsable">"#));
    }

    #[test]
    fn logout_redirects_home() {
        let fixture = Fixture::new();
        let key = fixture.session();
        let request = Request::blank("/logout")
            .with_post(MultiDict::new())
            .with_cookie("auth", &key);
        let response = fixture.ask(request).unwrap().unwrap();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(response.location(), Some("/"));

        let response = fixture
            .ask(Request::blank("/").with_cookie("auth", &key))
            .unwrap()
            .unwrap();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
    }
}
