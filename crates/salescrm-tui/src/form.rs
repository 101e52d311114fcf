//! Modal input forms for the create/edit actions on the dashboards.

use salescrm_core::models::{CredentialsUpdate, Prize, PrizeDraft, UserAccount};

use crate::app::{is_valid_input_char, Action};

/// Maximum length of any single form field.
const MAX_FIELD_LENGTH: usize = 128;

#[derive(Debug, Clone, PartialEq)]
pub enum FormKind {
    CreateAdmin,
    /// Agent created from the super admin dashboard.
    CreateAgentAsSuperAdmin,
    CreateAgent,
    EditCredentials { user_id: String },
    ChangeAdminPassword { admin_id: String },
    CreatePrize,
    EditPrize { prize_id: String },
    SetTarget { agent_id: String },
}

#[derive(Debug, Clone, PartialEq)]
pub struct FormField {
    pub label: &'static str,
    pub value: String,
    pub secret: bool,
}

impl FormField {
    fn text(label: &'static str, value: impl Into<String>) -> Self {
        Self {
            label,
            value: value.into(),
            secret: false,
        }
    }

    fn secret(label: &'static str) -> Self {
        Self {
            label,
            value: String::new(),
            secret: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Form {
    pub kind: FormKind,
    pub title: String,
    pub fields: Vec<FormField>,
    pub focus: usize,
    pub error: Option<String>,
}

impl Form {
    fn new(kind: FormKind, title: impl Into<String>, fields: Vec<FormField>) -> Self {
        Self {
            kind,
            title: title.into(),
            fields,
            focus: 0,
            error: None,
        }
    }

    /// Username/password/name form for a new admin or agent.
    pub fn new_account(kind: FormKind) -> Self {
        let title = match kind {
            FormKind::CreateAdmin => "Create Admin",
            _ => "Create Agent",
        };
        Self::new(
            kind,
            title,
            vec![
                FormField::text("Username", ""),
                FormField::secret("Password"),
                FormField::text("Name", ""),
            ],
        )
    }

    pub fn edit_credentials(account: &UserAccount) -> Self {
        Self::new(
            FormKind::EditCredentials {
                user_id: account.id.clone(),
            },
            format!("Edit Credentials: {}", account.display_name()),
            vec![
                FormField::text("Username", account.username.clone()),
                FormField::secret("New password"),
                FormField::text("Name", account.name.clone().unwrap_or_default()),
            ],
        )
    }

    pub fn change_admin_password(admin: &UserAccount) -> Self {
        Self::new(
            FormKind::ChangeAdminPassword {
                admin_id: admin.id.clone(),
            },
            format!("Change Password: {}", admin.display_name()),
            vec![FormField::secret("New password")],
        )
    }

    pub fn new_prize() -> Self {
        Self::prize(FormKind::CreatePrize, "Add Prize", &PrizeDraft::default())
    }

    pub fn edit_prize(prize: &Prize) -> Self {
        Self::prize(
            FormKind::EditPrize {
                prize_id: prize.id.clone(),
            },
            "Edit Prize",
            &PrizeDraft::from(prize),
        )
    }

    fn prize(kind: FormKind, title: &str, draft: &PrizeDraft) -> Self {
        let coin_cost = if draft.coin_cost > 0.0 {
            draft.coin_cost.to_string()
        } else {
            String::new()
        };
        Self::new(
            kind,
            title,
            vec![
                FormField::text("Name", draft.name.clone()),
                FormField::text("Description", draft.description.clone()),
                FormField::text("Coin cost", coin_cost),
                FormField::text("Limited (y/n)", if draft.is_limited { "y" } else { "n" }),
                FormField::text(
                    "Quantity",
                    draft.quantity_available.map(|q| q.to_string()).unwrap_or_default(),
                ),
            ],
        )
    }

    pub fn set_target(agent: &UserAccount) -> Self {
        Self::new(
            FormKind::SetTarget {
                agent_id: agent.id.clone(),
            },
            format!("Monthly Target: {}", agent.display_name()),
            vec![FormField::text(
                "Target deposits",
                agent.target_monthly.map(|t| t.to_string()).unwrap_or_default(),
            )],
        )
    }

    pub fn focus_next(&mut self) {
        self.focus = (self.focus + 1) % self.fields.len().max(1);
    }

    pub fn focus_prev(&mut self) {
        let len = self.fields.len().max(1);
        self.focus = (self.focus + len - 1) % len;
    }

    pub fn is_last_field(&self) -> bool {
        self.focus + 1 >= self.fields.len()
    }

    pub fn push_char(&mut self, c: char) {
        if let Some(field) = self.fields.get_mut(self.focus) {
            if field.value.chars().count() < MAX_FIELD_LENGTH && is_valid_input_char(c) {
                field.value.push(c);
            }
        }
    }

    pub fn pop_char(&mut self) {
        if let Some(field) = self.fields.get_mut(self.focus) {
            field.value.pop();
        }
    }

    /// Field text, trimmed unless the field is a password.
    fn value(&self, index: usize) -> &str {
        match self.fields.get(index) {
            Some(field) if field.secret => &field.value,
            Some(field) => field.value.trim(),
            None => "",
        }
    }

    /// Validate the fields and build the write to perform.
    pub fn to_action(&self) -> Result<Action, String> {
        match &self.kind {
            FormKind::CreateAdmin | FormKind::CreateAgentAsSuperAdmin | FormKind::CreateAgent => {
                let username = required(self.value(0), "Username")?;
                let password = required(self.value(1), "Password")?;
                let name = required(self.value(2), "Name")?;
                Ok(match self.kind {
                    FormKind::CreateAdmin => Action::CreateAdmin { username, password, name },
                    FormKind::CreateAgentAsSuperAdmin => {
                        Action::CreateAgentAsSuperAdmin { username, password, name }
                    }
                    _ => Action::CreateAgent { username, password, name },
                })
            }
            FormKind::EditCredentials { user_id } => {
                let update = CredentialsUpdate {
                    username: required(self.value(0), "Username")?,
                    password: self.value(1).to_string(),
                    name: self.value(2).to_string(),
                };
                Ok(Action::UpdateCredentials {
                    user_id: user_id.clone(),
                    update,
                })
            }
            FormKind::ChangeAdminPassword { admin_id } => Ok(Action::ChangeAdminPassword {
                admin_id: admin_id.clone(),
                new_password: required(self.value(0), "New password")?,
            }),
            FormKind::CreatePrize => Ok(Action::CreatePrize(self.prize_draft()?)),
            FormKind::EditPrize { prize_id } => Ok(Action::UpdatePrize {
                prize_id: prize_id.clone(),
                draft: self.prize_draft()?,
            }),
            FormKind::SetTarget { agent_id } => {
                let target = parse_number(self.value(0), "Target")?;
                if target < 0.0 {
                    return Err("Target cannot be negative".to_string());
                }
                Ok(Action::SetTarget {
                    agent_id: agent_id.clone(),
                    target_monthly: target,
                })
            }
        }
    }

    fn prize_draft(&self) -> Result<PrizeDraft, String> {
        let name = required(self.value(0), "Name")?;
        let coin_cost = parse_number(self.value(2), "Coin cost")?;
        if coin_cost <= 0.0 {
            return Err("Coin cost must be greater than zero".to_string());
        }
        let is_limited = match self.value(3).to_lowercase().as_str() {
            "y" | "yes" => true,
            "n" | "no" | "" => false,
            _ => return Err("Limited must be y or n".to_string()),
        };
        let quantity_available = if is_limited {
            let quantity: i64 = self
                .value(4)
                .parse()
                .map_err(|_| "Quantity must be a whole number".to_string())?;
            if quantity < 0 {
                return Err("Quantity cannot be negative".to_string());
            }
            Some(quantity)
        } else {
            None
        };
        Ok(PrizeDraft {
            name,
            description: self.value(1).to_string(),
            coin_cost,
            is_limited,
            quantity_available,
        })
    }
}

fn required(value: &str, label: &str) -> Result<String, String> {
    if value.is_empty() {
        Err(format!("{} is required", label))
    } else {
        Ok(value.to_string())
    }
}

fn parse_number(value: &str, label: &str) -> Result<f64, String> {
    value
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| format!("{} must be a number", label))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fill(form: &mut Form, values: &[&str]) {
        for (field, value) in form.fields.iter_mut().zip(values) {
            field.value = value.to_string();
        }
    }

    fn account() -> UserAccount {
        serde_json::from_str(
            r#"{"id":"a1","username":"agent1","role":"agent","name":"Agent One","target_monthly":20}"#,
        )
        .unwrap()
    }

    #[test]
    fn test_create_admin_requires_all_fields() {
        let mut form = Form::new_account(FormKind::CreateAdmin);
        fill(&mut form, &["admin2", "", "Second Admin"]);
        assert_eq!(form.to_action(), Err("Password is required".to_string()));

        fill(&mut form, &["admin2", "s3cret", "Second Admin"]);
        assert_eq!(
            form.to_action(),
            Ok(Action::CreateAdmin {
                username: "admin2".into(),
                password: "s3cret".into(),
                name: "Second Admin".into(),
            })
        );
    }

    #[test]
    fn test_passwords_keep_surrounding_spaces() {
        let mut form = Form::new_account(FormKind::CreateAgent);
        fill(&mut form, &["  agent2 ", " pass word ", " Agent Two"]);
        assert_eq!(
            form.to_action(),
            Ok(Action::CreateAgent {
                username: "agent2".into(),
                password: " pass word ".into(),
                name: "Agent Two".into(),
            })
        );

        let admin = account();
        let mut form = Form::change_admin_password(&admin);
        fill(&mut form, &["secret "]);
        assert_eq!(
            form.to_action(),
            Ok(Action::ChangeAdminPassword {
                admin_id: "a1".into(),
                new_password: "secret ".into(),
            })
        );
    }

    #[test]
    fn test_edit_credentials_prefills_and_allows_blank_password() {
        let form = Form::edit_credentials(&account());
        assert_eq!(form.fields[0].value, "agent1");
        assert_eq!(form.fields[2].value, "Agent One");
        assert!(form.fields[1].secret);

        match form.to_action().unwrap() {
            Action::UpdateCredentials { user_id, update } => {
                assert_eq!(user_id, "a1");
                assert_eq!(update.password, "");
                assert_eq!(update.name, "Agent One");
            }
            other => panic!("unexpected action {:?}", other),
        }
    }

    #[test]
    fn test_prize_validation() {
        let mut form = Form::new_prize();
        fill(&mut form, &["Gift Card", "$50", "abc", "n", ""]);
        assert_eq!(form.to_action(), Err("Coin cost must be a number".to_string()));

        fill(&mut form, &["Gift Card", "$50", "10", "y", ""]);
        assert_eq!(form.to_action(), Err("Quantity must be a whole number".to_string()));

        fill(&mut form, &["Gift Card", "$50", "10", "maybe", ""]);
        assert_eq!(form.to_action(), Err("Limited must be y or n".to_string()));

        fill(&mut form, &["Gift Card", "$50", "10", "y", "5"]);
        match form.to_action().unwrap() {
            Action::CreatePrize(draft) => {
                assert_eq!(draft.coin_cost, 10.0);
                assert!(draft.is_limited);
                assert_eq!(draft.quantity_available, Some(5));
            }
            other => panic!("unexpected action {:?}", other),
        }
    }

    #[test]
    fn test_unlimited_prize_drops_quantity() {
        let mut form = Form::new_prize();
        fill(&mut form, &["Mug", "", "2.5", "n", "99"]);
        match form.to_action().unwrap() {
            Action::CreatePrize(draft) => assert_eq!(draft.quantity_available, None),
            other => panic!("unexpected action {:?}", other),
        }
    }

    #[test]
    fn test_set_target() {
        let mut form = Form::set_target(&account());
        assert_eq!(form.fields[0].value, "20");
        fill(&mut form, &["-1"]);
        assert_eq!(form.to_action(), Err("Target cannot be negative".to_string()));
        fill(&mut form, &["35.5"]);
        assert_eq!(
            form.to_action(),
            Ok(Action::SetTarget {
                agent_id: "a1".into(),
                target_monthly: 35.5,
            })
        );
    }

    #[test]
    fn test_focus_wraps_and_input_is_filtered() {
        let mut form = Form::new_account(FormKind::CreateAgent);
        form.focus_prev();
        assert_eq!(form.focus, 2);
        assert!(form.is_last_field());
        form.focus_next();
        assert_eq!(form.focus, 0);

        form.push_char('a');
        form.push_char('\n');
        form.push_char('b');
        assert_eq!(form.fields[0].value, "ab");
        form.pop_char();
        assert_eq!(form.fields[0].value, "a");
    }
}
