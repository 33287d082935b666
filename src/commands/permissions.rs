use serenity::all::Permissions;

/// Permissions a command needs before it runs.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CommandPermissions {
    /// Needed by the bot itself
    pub self_: Vec<Permissions>,
    /// Needed by whoever invoked the command
    pub author: Vec<Permissions>,
    /// Needed by both of them
    pub both: Vec<Permissions>,
}

impl CommandPermissions {
    pub fn is_empty(&self) -> bool {
        self.self_.is_empty() && self.author.is_empty() && self.both.is_empty()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PermissionTarget {
    Author,
    Bot,
    Both,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PermissionCheck {
    Granted,
    /// `target` is whoever lacks `permission`: the author or the bot, never both.
    Missing {
        target: PermissionTarget,
        permission: Permissions,
    },
}

impl PermissionCheck {
    /// The reply sent when a command is refused, `None` when granted.
    pub fn refusal(&self) -> Option<String> {
        let PermissionCheck::Missing { target, permission } = self else {
            return None;
        };
        let who = match target {
            PermissionTarget::Bot => "I am",
            PermissionTarget::Author | PermissionTarget::Both => "You are",
        };
        Some(format!(
            "{} missing the **{}** permission.",
            who,
            display_name(*permission)
        ))
    }
}

/// Human name of a permission, e.g. "Manage Messages".
pub fn display_name(permission: Permissions) -> String {
    permission.get_permission_names().join(", ")
}

/// Parse permission names as written in module files (`MANAGE_MESSAGES`).  Returns the parsed
/// permissions and the names that weren't recognised.
pub fn parse_names<S: AsRef<str>>(names: &[S]) -> (Vec<Permissions>, Vec<String>) {
    let mut parsed = Vec::new();
    let mut unknown = Vec::new();
    for name in names {
        let name = name.as_ref().trim();
        match Permissions::from_name(&name.to_uppercase()) {
            Some(permission) => parsed.push(permission),
            None => unknown.push(name.to_owned()),
        }
    }
    (parsed, unknown)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_flag_names() {
        let (parsed, unknown) = parse_names(&["MANAGE_MESSAGES", "send_messages", "FLY"]);
        assert_eq!(
            parsed,
            vec![Permissions::MANAGE_MESSAGES, Permissions::SEND_MESSAGES]
        );
        assert_eq!(unknown, vec!["FLY"]);
    }

    #[test]
    fn emptiness_covers_every_scope() {
        assert!(CommandPermissions::default().is_empty());
        let author_only = CommandPermissions {
            author: vec![Permissions::KICK_MEMBERS],
            ..Default::default()
        };
        assert!(!author_only.is_empty());
    }

    #[test]
    fn refusals_name_who_is_missing_what() {
        let bot = PermissionCheck::Missing {
            target: PermissionTarget::Bot,
            permission: Permissions::MANAGE_MESSAGES,
        };
        assert_eq!(
            bot.refusal().unwrap(),
            "I am missing the **Manage Messages** permission."
        );

        let author = PermissionCheck::Missing {
            target: PermissionTarget::Author,
            permission: Permissions::KICK_MEMBERS,
        };
        assert_eq!(
            author.refusal().unwrap(),
            "You are missing the **Kick Members** permission."
        );

        assert_eq!(PermissionCheck::Granted.refusal(), None);
    }
}
