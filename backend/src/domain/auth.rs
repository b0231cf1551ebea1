//! Authentication primitives: login credentials and registration requests.
//!
//! Handlers build these from raw payload strings; the constructors reject
//! anything the account services must never see.

use std::fmt;

use zeroize::Zeroizing;

use super::user::{DisplayName, Email, UserValidationError};

/// Minimum password length accepted at registration.
pub const PASSWORD_MIN_LENGTH: usize = 8;

/// Domain error returned when login payload values are invalid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoginValidationError {
    /// Email was missing or blank once trimmed.
    EmptyEmail,
    /// Email was present but malformed.
    InvalidEmail,
    /// Password was blank.
    EmptyPassword,
}

impl fmt::Display for LoginValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyEmail => write!(f, "email must not be empty"),
            Self::InvalidEmail => write!(f, "email address is not valid"),
            Self::EmptyPassword => write!(f, "password must not be empty"),
        }
    }
}

impl std::error::Error for LoginValidationError {}

/// Validated login credentials.
///
/// The password keeps caller-provided whitespace and is zeroised on drop.
///
/// # Examples
/// ```
/// use bookchat::domain::LoginCredentials;
///
/// let creds = LoginCredentials::try_from_parts("Reader@Example.com", "Secret123").unwrap();
/// assert_eq!(creds.email().as_ref(), "reader@example.com");
/// assert_eq!(creds.password(), "Secret123");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginCredentials {
    email: Email,
    password: Zeroizing<String>,
}

impl LoginCredentials {
    /// Construct credentials from raw email/password inputs.
    pub fn try_from_parts(email: &str, password: &str) -> Result<Self, LoginValidationError> {
        let email = Email::new(email).map_err(|err| match err {
            UserValidationError::EmptyEmail => LoginValidationError::EmptyEmail,
            _ => LoginValidationError::InvalidEmail,
        })?;
        if password.is_empty() {
            return Err(LoginValidationError::EmptyPassword);
        }
        Ok(Self {
            email,
            password: Zeroizing::new(password.to_owned()),
        })
    }

    /// Normalised email used for the account lookup.
    pub fn email(&self) -> &Email {
        &self.email
    }

    /// Password string provided by the caller.
    pub fn password(&self) -> &str {
        self.password.as_str()
    }
}

/// Reasons a registration payload is rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistrationValidationError {
    Email(UserValidationError),
    Name(UserValidationError),
    PasswordTooShort { min: usize },
    PasswordMissingUppercase,
    PasswordMissingLowercase,
    PasswordMissingDigit,
}

impl RegistrationValidationError {
    /// Name of the offending payload field.
    pub fn field(&self) -> &'static str {
        match self {
            Self::Email(_) => "email",
            Self::Name(_) => "name",
            _ => "password",
        }
    }

    /// Stable machine-readable code for the failure.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Email(UserValidationError::EmptyEmail) => "missing_email",
            Self::Email(_) => "invalid_email",
            Self::Name(_) => "name_too_short",
            Self::PasswordTooShort { .. } => "password_too_short",
            Self::PasswordMissingUppercase
            | Self::PasswordMissingLowercase
            | Self::PasswordMissingDigit => "weak_password",
        }
    }
}

impl fmt::Display for RegistrationValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Email(err) | Self::Name(err) => err.fmt(f),
            Self::PasswordTooShort { min } => {
                write!(f, "password must be at least {min} characters")
            }
            Self::PasswordMissingUppercase => {
                write!(f, "password must contain an upper-case letter")
            }
            Self::PasswordMissingLowercase => {
                write!(f, "password must contain a lower-case letter")
            }
            Self::PasswordMissingDigit => write!(f, "password must contain a digit"),
        }
    }
}

impl std::error::Error for RegistrationValidationError {}

/// Check the password strength rules applied at registration.
pub fn check_password_strength(password: &str) -> Result<(), RegistrationValidationError> {
    if password.chars().count() < PASSWORD_MIN_LENGTH {
        return Err(RegistrationValidationError::PasswordTooShort {
            min: PASSWORD_MIN_LENGTH,
        });
    }
    if !password.chars().any(char::is_uppercase) {
        return Err(RegistrationValidationError::PasswordMissingUppercase);
    }
    if !password.chars().any(char::is_lowercase) {
        return Err(RegistrationValidationError::PasswordMissingLowercase);
    }
    if !password.chars().any(|c| c.is_ascii_digit()) {
        return Err(RegistrationValidationError::PasswordMissingDigit);
    }
    Ok(())
}

/// Validated sign-up request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Registration {
    email: Email,
    name: DisplayName,
    password: Zeroizing<String>,
}

impl Registration {
    /// Validate raw registration inputs.
    pub fn try_from_parts(
        email: &str,
        password: &str,
        name: &str,
    ) -> Result<Self, RegistrationValidationError> {
        let email = Email::new(email).map_err(RegistrationValidationError::Email)?;
        check_password_strength(password)?;
        let name = DisplayName::new(name).map_err(RegistrationValidationError::Name)?;
        Ok(Self {
            email,
            name,
            password: Zeroizing::new(password.to_owned()),
        })
    }

    pub fn email(&self) -> &Email {
        &self.email
    }

    pub fn name(&self) -> &DisplayName {
        &self.name
    }

    pub fn password(&self) -> &str {
        self.password.as_str()
    }
}
