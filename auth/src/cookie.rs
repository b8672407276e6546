use std::sync::Arc;

use actix_web::http::{Method, StatusCode};
use fw_error::Result;
use fw_forms::{conv::Char, Field, Form, MultiDict, Value, Widget};
use fw_web::{chain, endpoint, handler, match_path, method, Chain, Data, Env, Next, Request, Response, WebHandler};
use rand::RngCore;

use crate::storage::{LocalMemStorage, SessionStorage};

const SESSION_KEY_LEN: usize = 10;
const WRONG_CREDENTIALS: &str = "user or password is wrong";

/// Turns credentials into a stored identity and identities into users.
pub trait Identify: Send + Sync {
    type User: Clone + Send + Sync + 'static;

    fn get_user_identity(&self, env: &Env, login: &str, password: &str) -> Option<String>;

    fn identify_user(&self, env: &Env, identity: &str) -> Option<Self::User>;
}

/// Present in the env while an authenticated request is handled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Authenticated {
    pub identity: String,
}

struct CurrentUser<U>(U);

pub fn current_user<U: 'static>(env: &Env) -> Option<&U> {
    env.get::<CurrentUser<U>>().map(|user| &user.0)
}

/// Login and password inputs. The password is taken verbatim, surrounding
/// whitespace included.
pub fn login_form() -> Form {
    Form::new(vec![
        Field::new("login").with_label("Username").into(),
        Field::new("password")
            .with_conv(Char::new().no_strip())
            .with_widget(Widget::password_input())
            .with_label("Password")
            .into(),
    ])
    .with_id("login")
}

/// Session cookie authentication. Sessions live in a `SessionStorage`
/// under `"{cookie_name}:{key}"`.
pub struct CookieAuth<I> {
    identify: I,
    storage: Arc<dyn SessionStorage>,
    cookie_name: String,
    cookie_path: String,
}

impl<I: Identify + 'static> CookieAuth<I> {
    pub fn new(identify: I) -> Self {
        fw_log::info(Some("⚡"), "[CookieAuth] Initializing component");

        Self {
            identify,
            storage: Arc::new(LocalMemStorage::new()),
            cookie_name: "auth".to_owned(),
            cookie_path: "/".to_owned(),
        }
    }

    pub fn with_storage(mut self, storage: Arc<dyn SessionStorage>) -> Self {
        self.storage = storage;
        self
    }

    pub fn with_cookie_name(mut self, name: &str) -> Self {
        self.cookie_name = name.to_owned();
        self
    }

    pub fn with_cookie_path(mut self, path: &str) -> Self {
        self.cookie_path = path.to_owned();
        self
    }

    pub fn cookie_name(&self) -> &str {
        &self.cookie_name
    }

    pub fn identify(&self) -> &I {
        &self.identify
    }

    fn storage_key(&self, key: &str) -> String {
        format!("{}:{}", self.cookie_name, key)
    }

    /// Starts a session for `identity` and sets its cookie on `response`.
    pub fn login_identity(&self, identity: &str, response: &mut Response) {
        let mut bytes = [0u8; SESSION_KEY_LEN];
        rand::thread_rng().fill_bytes(&mut bytes);
        let key: String = bytes.iter().map(|byte| format!("{byte:02x}")).collect();

        response.set_cookie(&self.cookie_name, &key, &self.cookie_path);
        if !self.storage.set(&self.storage_key(&key), identity) {
            fw_log::info(None, "[CookieAuth] Session storage is unreachable");
        }
    }

    pub fn logout_user(&self, request: &Request) -> Response {
        let mut response = Response::default();
        response.delete_cookie(&self.cookie_name, &self.cookie_path);
        if let Some(key) = request.cookie(&self.cookie_name) {
            if !self.storage.delete(&self.storage_key(key)) {
                fw_log::info(None, "[CookieAuth] Session storage is unreachable");
            }
        }
        response
    }

    fn authenticate(&self, env: &Env) -> Option<(String, I::User)> {
        let key = env.request().cookie(&self.cookie_name)?;
        let identity = self.storage.get(&self.storage_key(key))?;
        let user = self.identify.identify_user(env, &identity)?;
        Some((identity, user))
    }

    /// Login page at `path`. GET shows the form; a successful POST starts a
    /// session and redirects to the `next` query parameter.
    pub fn login(self: &Arc<Self>, path: &str, template: &str) -> Chain {
        let auth = self.clone();
        let login_path = path.to_owned();
        let template = template.to_owned();

        chain()
            .then(match_path(path))
            .then(endpoint(move |env, data| {
                auth.handle_login(env, data, &login_path, &template)
            }))
    }

    fn handle_login(
        &self,
        env: &mut Env,
        data: &mut Data,
        login_path: &str,
        template: &str,
    ) -> Result<Response> {
        let mut form = login_form();
        let next = env.request().get().get_text("next").unwrap_or("/").to_owned();
        let mut message = None;

        if *env.request().method() == Method::POST && form.accept(env.request().post().clone()) {
            let field = |name: &str| {
                form.python_data()
                    .get(name)
                    .map(Value::to_raw_string)
                    .unwrap_or_default()
            };
            match self
                .identify
                .get_user_identity(env, &field("login"), &field("password"))
            {
                Some(identity) => {
                    fw_log::debug(None, format!("[CookieAuth] Logged in identity {identity}"));
                    let mut response = Response::redirect(StatusCode::SEE_OTHER, &next);
                    self.login_identity(&identity, &mut response);
                    return Ok(response);
                }
                None => message = Some(WRONG_CREDENTIALS),
            }
        }

        let login_url = format!(
            "{login_path}?{}",
            [("next", next.as_str())]
                .into_iter()
                .collect::<MultiDict>()
                .to_urlencoded()
        );
        data.insert("form", &form.render(env.templates())?)?;
        data.insert("message", &message)?;
        data.insert("login_url", &login_url)?;
        env.render_to_response(template, data)
    }

    /// Logout at `path`, POST only. Requests without a session cookie fall
    /// through.
    pub fn logout(self: &Arc<Self>, path: &str, redirect_to: &str) -> Chain {
        let auth = self.clone();
        let redirect_to = redirect_to.to_owned();

        chain()
            .then(match_path(path))
            .then(method(Method::POST))
            .then(handler(move |env, data, next| {
                if env.request().cookie(&auth.cookie_name).is_none() {
                    return next.call(env, data);
                }
                let mut response = auth.logout_user(env.request());
                response.set_status(StatusCode::SEE_OTHER);
                response.set_location(&redirect_to);
                Ok(Some(response))
            }))
    }
}

impl<I: Identify + 'static> WebHandler for CookieAuth<I> {
    fn handle(&self, env: &mut Env, data: &mut Data, next: Next<'_>) -> fw_web::HandlerResult {
        let authenticated = self.authenticate(env);
        fw_log::debug(
            None,
            format!(
                "[CookieAuth] Authenticated: {:?}",
                authenticated.as_ref().map(|(identity, _)| identity)
            ),
        );
        if let Some((identity, user)) = authenticated {
            env.insert(Authenticated { identity });
            env.insert(CurrentUser(user));
        }

        let result = next.call(env, data);

        env.remove::<Authenticated>();
        env.remove::<CurrentUser<I::User>>();
        result
    }
}

/// Lets only authenticated requests through; others are redirected to
/// `login_url` with the requested path as `next`.
pub fn auth_required(login_url: &str) -> impl WebHandler {
    let login_url = login_url.to_owned();
    handler(move |env, data, next| {
        if env.get::<Authenticated>().is_some() {
            return next.call(env, data);
        }
        let query = [("next", env.request().path())]
            .into_iter()
            .collect::<MultiDict>()
            .to_urlencoded();
        Ok(Some(Response::redirect(
            StatusCode::SEE_OTHER,
            &format!("{login_url}?{query}"),
        )))
    })
}
