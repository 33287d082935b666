//! Human-facing renderings of Discord objects

use serenity::all::{Guild, GuildChannel, Member, Mentionable, PartialGuild, Role, User};
use std::num::NonZeroU16;

pub type Formatter<T> = Box<dyn Fn(&T, bool) -> String + Send + Sync>;

/// Options for [`crate::Erisa::format`].
pub struct FormatOptions<T> {
    /// Alternate, shorter rendering, e.g. a user without their discriminator.
    pub alt: bool,
    /// Used instead of [`Formattable::format`] when present.
    pub formatter: Option<Formatter<T>>,
}

impl<T> Default for FormatOptions<T> {
    fn default() -> Self {
        Self {
            alt: false,
            formatter: None,
        }
    }
}

pub trait Formattable {
    fn format(&self, alt: bool) -> String;
}

impl Formattable for User {
    fn format(&self, alt: bool) -> String {
        tagged(&self.name, self.discriminator, alt)
    }
}

impl Formattable for Member {
    fn format(&self, alt: bool) -> String {
        // May not have a server nickname.  Fall back to the account name.
        let name = self.nick.as_deref().unwrap_or(&self.user.name);
        tagged(name, self.user.discriminator, alt)
    }
}

impl Formattable for Role {
    fn format(&self, _alt: bool) -> String {
        if self.mentionable {
            self.mention().to_string()
        } else {
            self.name.clone()
        }
    }
}

impl Formattable for GuildChannel {
    fn format(&self, _alt: bool) -> String {
        self.mention().to_string()
    }
}

impl Formattable for Guild {
    fn format(&self, _alt: bool) -> String {
        self.name.clone()
    }
}

impl Formattable for PartialGuild {
    fn format(&self, _alt: bool) -> String {
        self.name.clone()
    }
}

/// `name#0000`, or just `name` in alt mode or for accounts migrated off discriminators.
pub fn tagged(name: &str, discriminator: Option<NonZeroU16>, alt: bool) -> String {
    match discriminator {
        Some(discriminator) if !alt => format!("{}#{:04}", name, discriminator.get()),
        _ => name.to_owned(),
    }
}
