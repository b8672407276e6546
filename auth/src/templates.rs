use fw_error::Result;
use fw_template::LiquidTemplates;

pub const LOGIN_TEMPLATE: &str = "login";

const LOGIN: &str = r#"<!DOCTYPE html>
<html>
<head><title>Login</title></head>
<body>
<form method="post" action="{{ login_url | escape }}">
{% if message %}<p class="error">{{ message | escape }}</p>{% endif %}
{{ form }}
<button type="submit">Login</button>
</form>
</body>
</html>
"#;

pub fn register_templates(templates: &LiquidTemplates) -> Result<()> {
    templates.register(LOGIN_TEMPLATE, LOGIN)
}
