//! Input forms for the public pages.

use misinvoice_core::routes::{query_param, Route};
use misinvoice_core::Role;

// ============================================================================
// Constants
// ============================================================================

/// Maximum length for e-mail input.
const MAX_EMAIL_LENGTH: usize = 100;

/// Maximum length for the display name on registration.
const MAX_NAME_LENGTH: usize = 60;

/// Maximum length for password input.
/// 128 chars accommodates password managers and passphrases.
const MAX_PASSWORD_LENGTH: usize = 128;

/// Reset and verification tokens are pasted from e-mail links.
const MAX_TOKEN_LENGTH: usize = 512;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Name,
    Email,
    Password,
    NewPassword,
    Token,
}

impl FieldKind {
    pub fn label(&self) -> &'static str {
        match self {
            FieldKind::Name => "Name",
            FieldKind::Email => "Email",
            FieldKind::Password => "Password",
            FieldKind::NewPassword => "New password",
            FieldKind::Token => "Token",
        }
    }

    pub fn is_secret(&self) -> bool {
        matches!(self, FieldKind::Password | FieldKind::NewPassword)
    }

    fn max_len(&self) -> usize {
        match self {
            FieldKind::Name => MAX_NAME_LENGTH,
            FieldKind::Email => MAX_EMAIL_LENGTH,
            FieldKind::Password | FieldKind::NewPassword => MAX_PASSWORD_LENGTH,
            FieldKind::Token => MAX_TOKEN_LENGTH,
        }
    }
}

/// Check if a character should be accepted into a field
pub fn can_add_char(kind: FieldKind, current_len: usize, c: char) -> bool {
    current_len < kind.max_len() && !c.is_control()
}

/// Focusable part of a form
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormFocus {
    Field(usize),
    Role,
    Button,
}

#[derive(Debug, Clone)]
pub struct Form {
    pub route: Route,
    pub fields: Vec<(FieldKind, String)>,
    /// Role picker, registration only
    pub role: Option<Role>,
    pub focus: FormFocus,
    pub error: Option<String>,
    pub notice: Option<String>,
}

impl Form {
    /// The form a public page shows, if it has one. Tokens in the query
    /// string are prefilled, as is the last e-mail used to sign in.
    pub fn for_route(route: Route, path: &str, last_email: Option<&str>) -> Option<Self> {
        let kinds: &[FieldKind] = match route {
            Route::Login => &[FieldKind::Email, FieldKind::Password],
            Route::Register => &[FieldKind::Name, FieldKind::Email, FieldKind::Password],
            Route::ForgotPassword | Route::ResendVerification => &[FieldKind::Email],
            Route::ResetPassword => &[FieldKind::Token, FieldKind::NewPassword],
            Route::VerifyEmail => &[FieldKind::Token],
            _ => return None,
        };

        let fields: Vec<(FieldKind, String)> = kinds
            .iter()
            .map(|&kind| {
                let value = match kind {
                    FieldKind::Token => query_param(path, "token").unwrap_or_default(),
                    FieldKind::Email => last_email.unwrap_or_default(),
                    _ => "",
                };
                (kind, value.to_string())
            })
            .collect();

        let mut form = Self {
            route,
            fields,
            role: (route == Route::Register).then_some(Role::SalesPerson),
            focus: FormFocus::Field(0),
            error: None,
            notice: None,
        };
        form.focus = form.first_empty();
        Some(form)
    }

    pub fn title(&self) -> &'static str {
        self.route.title()
    }

    pub fn submit_label(&self) -> &'static str {
        match self.route {
            Route::Login => "Login",
            Route::Register => "Register",
            Route::ForgotPassword => "Send Reset Link",
            Route::ResetPassword => "Reset Password",
            Route::VerifyEmail => "Verify",
            _ => "Resend",
        }
    }

    fn first_empty(&self) -> FormFocus {
        self.fields
            .iter()
            .position(|(_, v)| v.is_empty())
            .map(FormFocus::Field)
            .unwrap_or(FormFocus::Button)
    }

    fn slots(&self) -> Vec<FormFocus> {
        let mut slots: Vec<FormFocus> = (0..self.fields.len()).map(FormFocus::Field).collect();
        if self.role.is_some() {
            slots.push(FormFocus::Role);
        }
        slots.push(FormFocus::Button);
        slots
    }

    fn move_focus(&mut self, forward: bool) {
        let slots = self.slots();
        let current = slots.iter().position(|s| *s == self.focus).unwrap_or(0);
        let next = if forward {
            (current + 1) % slots.len()
        } else {
            (current + slots.len() - 1) % slots.len()
        };
        self.focus = slots[next];
    }

    pub fn next_focus(&mut self) {
        self.move_focus(true);
    }

    pub fn prev_focus(&mut self) {
        self.move_focus(false);
    }

    pub fn focused_field(&self) -> Option<FieldKind> {
        match self.focus {
            FormFocus::Field(i) => self.fields.get(i).map(|(kind, _)| *kind),
            _ => None,
        }
    }

    pub fn push_char(&mut self, c: char) {
        if let FormFocus::Field(i) = self.focus {
            if let Some((kind, value)) = self.fields.get_mut(i) {
                if can_add_char(*kind, value.chars().count(), c) {
                    value.push(c);
                }
            }
        }
    }

    pub fn pop_char(&mut self) {
        if let FormFocus::Field(i) = self.focus {
            if let Some((_, value)) = self.fields.get_mut(i) {
                value.pop();
            }
        }
    }

    pub fn cycle_role(&mut self) {
        if let Some(role) = self.role {
            let i = Role::ALL.iter().position(|r| *r == role).unwrap_or(0);
            self.role = Some(Role::ALL[(i + 1) % Role::ALL.len()]);
        }
    }

    pub fn value(&self, kind: FieldKind) -> &str {
        self.fields
            .iter()
            .find(|(k, _)| *k == kind)
            .map(|(_, v)| v.trim())
            .unwrap_or_default()
    }

    /// Passwords are never trimmed.
    pub fn secret(&self, kind: FieldKind) -> &str {
        self.fields
            .iter()
            .find(|(k, _)| *k == kind)
            .map(|(_, v)| v.as_str())
            .unwrap_or_default()
    }

    /// Client-side checks before anything is sent.
    pub fn validate(&self) -> Result<(), String> {
        let missing: Vec<&str> = self
            .fields
            .iter()
            .filter(|(_, v)| v.trim().is_empty())
            .map(|(k, _)| k.label())
            .collect();
        if !missing.is_empty() {
            return Err(format!("{} required", missing.join(", ")));
        }
        let email = self.value(FieldKind::Email);
        if self.fields.iter().any(|(k, _)| *k == FieldKind::Email) && !email.contains('@') {
            return Err("Enter a valid email address".to_string());
        }
        Ok(())
    }

    pub fn clear_secrets(&mut self) {
        for (kind, value) in &mut self.fields {
            if kind.is_secret() {
                value.clear();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_public_pages_have_forms() {
        assert!(Form::for_route(Route::Login, "/login", None).is_some());
        assert!(Form::for_route(Route::Dashboard, "/dashboard", None).is_none());
        assert!(Form::for_route(Route::Invoices, "/invoices", None).is_none());
    }

    #[test]
    fn test_login_prefills_email_and_focuses_password() {
        let form = Form::for_route(Route::Login, "/login", Some("ops@example.test")).unwrap();
        assert_eq!(form.value(FieldKind::Email), "ops@example.test");
        assert_eq!(form.focus, FormFocus::Field(1));
        assert_eq!(form.submit_label(), "Login");
    }

    #[test]
    fn test_reset_token_from_query() {
        let form = Form::for_route(Route::ResetPassword, "/reset-password?token=abc123", None).unwrap();
        assert_eq!(form.value(FieldKind::Token), "abc123");
        assert_eq!(form.focused_field(), Some(FieldKind::NewPassword));
    }

    #[test]
    fn test_verify_link_with_token_focuses_button() {
        let form = Form::for_route(Route::VerifyEmail, "/api/verify?token=t0k", None).unwrap();
        assert_eq!(form.focus, FormFocus::Button);
    }

    #[test]
    fn test_register_focus_cycle_includes_role() {
        let mut form = Form::for_route(Route::Register, "/register", None).unwrap();
        assert_eq!(form.role, Some(Role::SalesPerson));
        let mut seen = vec![form.focus];
        for _ in 0..4 {
            form.next_focus();
            seen.push(form.focus);
        }
        assert_eq!(
            seen,
            vec![
                FormFocus::Field(0),
                FormFocus::Field(1),
                FormFocus::Field(2),
                FormFocus::Role,
                FormFocus::Button,
            ]
        );
        form.next_focus();
        assert_eq!(form.focus, FormFocus::Field(0));
        form.prev_focus();
        assert_eq!(form.focus, FormFocus::Button);
    }

    #[test]
    fn test_cycle_role() {
        let mut form = Form::for_route(Route::Register, "/register", None).unwrap();
        form.cycle_role();
        assert_eq!(form.role, Some(Role::Administrator));
        form.cycle_role();
        assert_eq!(form.role, Some(Role::SalesPerson));

        let mut login = Form::for_route(Route::Login, "/login", None).unwrap();
        login.cycle_role();
        assert_eq!(login.role, None);
    }

    #[test]
    fn test_typing_and_limits() {
        let mut form = Form::for_route(Route::ForgotPassword, "/forgot-password", None).unwrap();
        for c in "a@b.test".chars() {
            form.push_char(c);
        }
        form.push_char('\n');
        assert_eq!(form.value(FieldKind::Email), "a@b.test");
        form.pop_char();
        assert_eq!(form.value(FieldKind::Email), "a@b.tes");

        assert!(can_add_char(FieldKind::Email, 99, 'x'));
        assert!(!can_add_char(FieldKind::Email, 100, 'x'));
        assert!(can_add_char(FieldKind::Password, 127, '!'));
        assert!(!can_add_char(FieldKind::Password, 128, '!'));
        assert!(!can_add_char(FieldKind::Token, 0, '\t'));
    }

    #[test]
    fn test_validate() {
        let mut form = Form::for_route(Route::Login, "/login", None).unwrap();
        assert_eq!(form.validate(), Err("Email, Password required".to_string()));

        form.fields[0].1 = "not-an-email".into();
        form.fields[1].1 = "secret".into();
        assert_eq!(form.validate(), Err("Enter a valid email address".to_string()));

        form.fields[0].1 = " ops@example.test ".into();
        assert_eq!(form.validate(), Ok(()));
        assert_eq!(form.value(FieldKind::Email), "ops@example.test");
    }

    #[test]
    fn test_clear_secrets_keeps_email() {
        let mut form = Form::for_route(Route::Login, "/login", Some("a@b.test")).unwrap();
        form.fields[1].1 = " pw ".into();
        assert_eq!(form.secret(FieldKind::Password), " pw ");
        form.clear_secrets();
        assert_eq!(form.secret(FieldKind::Password), "");
        assert_eq!(form.value(FieldKind::Email), "a@b.test");
    }
}
