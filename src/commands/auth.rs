use std::fmt;
use thiserror::Error as ThisError;
use tracing::error;

use crate::auth::verify_password;
use crate::commands::executable::Executable;
use crate::commands::CommandParser;
use crate::context::Context;
use crate::frame::Frame;
use crate::Error;

#[derive(Debug, ThisError, PartialEq, Eq)]
pub enum AuthError {
    #[error("ERR Client sent AUTH, but no password is set")]
    NoPasswordSet,
    #[error("ERR invalid password")]
    InvalidPassword,
}

/// Authenticates the current connection against `requirepass`.
///
/// Ref: <https://redis.io/docs/latest/commands/auth/>
#[derive(PartialEq)]
pub struct Auth {
    pub password: String,
}

impl Auth {
    pub fn verify(&self, ctx: &Context) -> Result<(), AuthError> {
        let stored = ctx
            .config
            .requirepass()
            .ok_or(AuthError::NoPasswordSet)?;

        outcome(verify_password(&self.password, &stored))
    }

    /// Same as [`Auth::verify`], with the key derivation moved to the blocking pool so a client
    /// hammering AUTH cannot stall the runtime's worker threads.
    pub async fn verify_off_thread(self, ctx: &Context) -> Result<(), AuthError> {
        let stored = ctx
            .config
            .requirepass()
            .ok_or(AuthError::NoPasswordSet)?;

        let password = self.password;
        match tokio::task::spawn_blocking(move || verify_password(&password, &stored)).await {
            Ok(matches) => outcome(matches),
            Err(e) => {
                error!(cause = %e, "password check did not complete");
                Err(AuthError::InvalidPassword)
            }
        }
    }

    pub fn reply(result: Result<(), AuthError>) -> Frame {
        match result {
            Ok(()) => Frame::Simple("OK".to_string()),
            Err(e) => Frame::Error(e.to_string()),
        }
    }
}

fn outcome(matches: bool) -> Result<(), AuthError> {
    if matches {
        Ok(())
    } else {
        Err(AuthError::InvalidPassword)
    }
}

// Keeps the password out of logs.
impl fmt::Debug for Auth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Auth").field("password", &"<redacted>").finish()
    }
}

impl Executable for Auth {
    fn exec(self, ctx: &Context) -> Result<Frame, Error> {
        Ok(Auth::reply(self.verify(ctx)))
    }
}

impl TryFrom<&mut CommandParser> for Auth {
    type Error = Error;

    fn try_from(parser: &mut CommandParser) -> Result<Self, Self::Error> {
        let password = parser.next_string()?;
        Ok(Self { password })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::hash_password;
    use crate::commands::Command;
    use crate::config::Config;

    #[test]
    fn no_password_set() {
        let cmd = Command::try_from(Frame::request(["AUTH", "secret"])).unwrap();

        assert_eq!(
            cmd.exec(&Context::default()).unwrap(),
            Frame::Error("ERR Client sent AUTH, but no password is set".to_string())
        );
    }

    #[test]
    fn plaintext_password() {
        let ctx = Context::new(Config::from_text("requirepass secret\n"));

        let ok = Command::try_from(Frame::request(["AUTH", "secret"])).unwrap();
        let wrong = Command::try_from(Frame::request(["AUTH", "guess"])).unwrap();

        assert_eq!(ok.exec(&ctx).unwrap(), Frame::Simple("OK".to_string()));
        assert_eq!(
            wrong.exec(&ctx).unwrap(),
            Frame::Error("ERR invalid password".to_string())
        );
    }

    #[test]
    fn hashed_password() {
        let ctx = Context::new(Config::from_text(&format!(
            "requirepass {}\n",
            hash_password("secret")
        )));

        let auth = Auth {
            password: "secret".to_string(),
        };
        assert_eq!(auth.verify(&ctx), Ok(()));

        let auth = Auth {
            password: "Secret".to_string(),
        };
        assert_eq!(auth.verify(&ctx), Err(AuthError::InvalidPassword));
    }

    #[tokio::test(flavor = "current_thread")]
    async fn hashed_password_check_leaves_the_runtime_free() {
        let ctx = Context::new(Config::from_text(&format!(
            "requirepass {}\n",
            hash_password("secret")
        )));
        let auth = Auth {
            password: "secret".to_string(),
        };
        let finished = std::sync::Mutex::new(Vec::new());

        // On a single-threaded runtime the second branch can only run first if the check
        // yields while the key is derived.
        tokio::join!(
            async {
                assert_eq!(auth.verify_off_thread(&ctx).await, Ok(()));
                finished.lock().unwrap().push("auth");
            },
            async {
                finished.lock().unwrap().push("other");
            },
        );

        assert_eq!(*finished.lock().unwrap(), vec!["other", "auth"]);
    }

    #[tokio::test]
    async fn off_thread_check_rejects_wrong_password() {
        let ctx = Context::new(Config::from_text("requirepass secret\n"));
        let auth = Auth {
            password: "guess".to_string(),
        };

        assert_eq!(
            auth.verify_off_thread(&ctx).await,
            Err(AuthError::InvalidPassword)
        );
        let auth = Auth {
            password: "secret".to_string(),
        };
        assert_eq!(
            auth.verify_off_thread(&Context::default()).await,
            Err(AuthError::NoPasswordSet)
        );
    }

    #[test]
    fn debug_hides_password() {
        let auth = Auth {
            password: "secret".to_string(),
        };

        assert!(!format!("{auth:?}").contains("secret"));
    }
}
