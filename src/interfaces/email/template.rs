use crate::config::DEFAULT_LINK_BASE;
use crate::domain::confirmation::Dispatch;

/// Sender, subject and link base shared by every confirmation email.
#[derive(Debug, Clone)]
pub struct EmailTemplate {
    pub link_base: String,
    pub from: String,
    pub subject: String,
}

impl Default for EmailTemplate {
    fn default() -> Self {
        Self {
            link_base: DEFAULT_LINK_BASE.to_string(),
            from: "No-Reply <no-reply@example.com>".to_string(),
            subject: "Confirm your email address".to_string(),
        }
    }
}

impl EmailTemplate {
    pub fn link_for(&self, dispatch: &Dispatch) -> String {
        format!("{}{}", self.link_base, dispatch.token)
    }
}

/// A rendered confirmation message, ready to hand to a transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfirmationEmail {
    pub from: String,
    pub to: String,
    pub subject: String,
    pub link: String,
    pub text_body: String,
    pub html_body: String,
}

impl ConfirmationEmail {
    pub fn render(template: &EmailTemplate, dispatch: &Dispatch) -> Self {
        let link = template.link_for(dispatch);
        let text_body = format!(
            "Hello,\n\nIf you requested this, confirm your address by opening the link below:\n\n{link}\n\nIf it wasn't you, just ignore this email.\n"
        );
        let html_body = format!(
            r#"<html><body>
<p>Hello,</p>
<p>If you requested this, confirm it by pressing the button below:</p>
<a href="{link}" style="display:inline-block;padding:10px 20px;background-color:#28a745;color:white;text-decoration:none;border-radius:5px;">
  Confirm
</a>
<p>If it wasn't you, just ignore this email.</p>
</body></html>"#
        );

        Self {
            from: template.from.clone(),
            to: dispatch.address.clone(),
            subject: template.subject.clone(),
            link,
            text_body,
            html_body,
        }
    }
}
