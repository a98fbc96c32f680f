//! Who a log entry is attributed to.

use emeset::http::Session;
use emeset::Env;
use serde_json::Value;

/// Env key naming the session entry that holds the logged-in user.
pub const USER_KEY: &str = "session_user";
/// Env key naming the role field inside the user entry.
pub const ROLE_KEY: &str = "session_userRole";
/// Env key naming the nickname field inside the user entry.
pub const NICKNAME_KEY: &str = "session_userNickname";

pub const CRON: &str = "cron";
pub const GUEST: &str = "guest";
pub const USER: &str = "user";

const ADMIN_ROLE: &str = "admin";

/// Resolves the user label for a log entry.
///
/// Cron jobs log as `cron`. Otherwise, when the three session keys are
/// configured and the session carries a role, admins log under their
/// nickname and everyone else as `user`. Anything else is `guest`.
pub fn resolve(env: &Env, session: &Session, cron: bool) -> String {
    if cron {
        return CRON.to_string();
    }
    logged_in(env, session).unwrap_or_else(|| GUEST.to_string())
}

fn logged_in(env: &Env, session: &Session) -> Option<String> {
    let user_key = env.get(USER_KEY)?;
    let role_key = env.get(ROLE_KEY)?;
    let nickname_key = env.get(NICKNAME_KEY)?;

    let user = session.get(&user_key)?;
    let role = user.get(&role_key)?;
    if role.as_str() != Some(ADMIN_ROLE) {
        return Some(USER.to_string());
    }
    let nickname = match user.get(&nickname_key) {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Null) | None => return Some(USER.to_string()),
        Some(other) => other.to_string(),
    };
    Some(nickname)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn env() -> Env {
        Env::from_pairs([
            (USER_KEY, "user"),
            (ROLE_KEY, "role"),
            (NICKNAME_KEY, "nick"),
        ])
    }

    fn session(user: Value) -> Session {
        let session = Session::new();
        session.set("user", user);
        session
    }

    #[test]
    fn test_cron_wins() {
        let s = session(json!({"role": "admin", "nick": "ada"}));
        assert_eq!(resolve(&env(), &s, true), "cron");
    }

    #[test]
    fn test_admin_logs_under_nickname() {
        let s = session(json!({"role": "admin", "nick": "ada"}));
        assert_eq!(resolve(&env(), &s, false), "ada");
    }

    #[test]
    fn test_other_roles_are_user() {
        let s = session(json!({"role": "editor", "nick": "bob"}));
        assert_eq!(resolve(&env(), &s, false), "user");
    }

    #[test]
    fn test_no_session_user_is_guest() {
        assert_eq!(resolve(&env(), &Session::new(), false), "guest");
        let s = session(json!({"nick": "bob"}));
        assert_eq!(resolve(&env(), &s, false), "guest");
    }

    #[test]
    fn test_unconfigured_keys_are_guest() {
        let s = session(json!({"role": "admin", "nick": "ada"}));
        let partial = Env::from_pairs([(USER_KEY, "user"), (ROLE_KEY, "role")]);
        assert_eq!(resolve(&partial, &s, false), "guest");
    }
}
