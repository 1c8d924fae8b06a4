use tracing::debug;

use super::{
    CredentialsStore,
    profile::{
        ACCESS_KEY_ID, ASSUMED_ROLE_ARN, ASSUMED_ROLE_ID, EXPIRATION, Profile,
        SECRET_ACCESS_KEY, SESSION_TOKEN, is_short_term, short_term_name,
    },
};
use crate::{
    aws::{LongTermCredentials, TemporaryCredentials},
    error::{Error, Result},
};

impl CredentialsStore {
    /// Exact, case-sensitive lookup. Two sections with the same name are
    /// ambiguous and rejected.
    pub fn resolve(&self, name: &str) -> Result<Profile<'_>> {
        let mut matches = self
            .document
            .sections()
            .filter(|section| section.name() == name);

        match (matches.next(), matches.next()) {
            (Some(section), None) => Ok(Profile::new(section)),
            (Some(_), Some(_)) => Err(Error::MultipleProfilesFound(name.to_string())),
            (None, _) => Err(Error::ProfileNotFound(name.to_string())),
        }
    }

    /// Writes the temporary credentials to `<base_name>-short-term`,
    /// replacing every key an earlier run left there. Returns the profile
    /// name.
    pub fn upsert_short_term(
        &mut self,
        base_name: &str,
        credentials: &TemporaryCredentials,
    ) -> String {
        let name = short_term_name(base_name);

        let mut seen = false;
        self.document.retain_sections(|section| {
            if section.name() != name {
                return true;
            }
            let first = !seen;
            seen = true;
            first
        });

        let section = self.document.section_mut_or_append(&name);
        section.clear();
        section.set(ACCESS_KEY_ID, &credentials.access_key_id);
        section.set(SECRET_ACCESS_KEY, &credentials.secret_access_key);
        section.set(SESSION_TOKEN, &credentials.session_token);
        section.set(EXPIRATION, credentials.format_expiration());

        if let Some(role) = &credentials.assumed_role {
            section.set(ASSUMED_ROLE_ARN, &role.arn);
            if let Some(id) = &role.id {
                section.set(ASSUMED_ROLE_ID, id);
            }
        }

        debug!("Upserted short-term profile {}", name);
        name
    }

    /// Names of all long-term profiles, in file order
    pub fn list_base_profiles(&self) -> Vec<&str> {
        self.document
            .sections()
            .map(|section| section.name())
            .filter(|name| !is_short_term(name))
            .collect()
    }

    pub fn list_short_term_profiles(&self) -> Vec<Profile<'_>> {
        self.document
            .sections()
            .map(Profile::new)
            .filter(Profile::is_short_term)
            .collect()
    }

    /// Removes every short-term profile; zero is a valid count
    pub fn delete_short_term_profiles(&mut self) -> usize {
        let removed = self
            .document
            .retain_sections(|section| !is_short_term(section.name()));
        debug!("Removed short-term profiles: {:?}", removed);
        removed.len()
    }
}

/// The `--device` override wins over the profile's own serial
pub fn find_mfa_serial(profile: &Profile<'_>, device: Option<&str>) -> Result<String> {
    device
        .filter(|device| !device.is_empty())
        .or_else(|| profile.mfa_serial())
        .map(String::from)
        .ok_or_else(|| Error::NoMfaDeviceFound(profile.name().to_string()))
}

pub fn long_term_credentials(profile: &Profile<'_>) -> Result<LongTermCredentials> {
    let access_key_id = profile
        .access_key_id()
        .ok_or_else(|| Error::NoAccessKey(profile.name().to_string()))?;
    let secret_access_key = profile
        .secret_access_key()
        .ok_or_else(|| Error::NoSecretKey(profile.name().to_string()))?;

    Ok(LongTermCredentials {
        access_key_id: access_key_id.to_string(),
        secret_access_key: secret_access_key.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aws::AssumedRole;
    use aws_smithy_types::DateTime;

    const STORE: &str = "\
[default]
aws_access_key_id = AKIADEFAULT
aws_secret_access_key = default-secret
mfa_serial = arn:aws:iam::123456789012:mfa/default

[dev]
aws_access_key_id = AKIADEV
aws_secret_access_key = dev-secret
";

    fn store(text: &str) -> CredentialsStore {
        CredentialsStore::parse("credentials", text).unwrap()
    }

    fn temporary(role: Option<AssumedRole>) -> TemporaryCredentials {
        TemporaryCredentials {
            access_key_id: "ASIATEMP".to_string(),
            secret_access_key: "temp-secret".to_string(),
            session_token: "temp-token".to_string(),
            expiration: DateTime::from_secs(4_102_444_800),
            assumed_role: role,
        }
    }

    #[test]
    fn test_resolve() {
        let store = store(STORE);
        assert_eq!(store.resolve("dev").unwrap().name(), "dev");
        assert!(matches!(
            store.resolve("Dev").unwrap_err(),
            Error::ProfileNotFound(name) if name == "Dev"
        ));
    }

    #[test]
    fn test_resolve_rejects_duplicate_sections() {
        let store = store("[test]\nbla = 2\n[test]\nbla = 3\n");
        assert!(matches!(
            store.resolve("test").unwrap_err(),
            Error::MultipleProfilesFound(_)
        ));
    }

    #[test]
    fn test_find_mfa_serial() {
        let store = store(STORE);
        let default = store.resolve("default").unwrap();
        let dev = store.resolve("dev").unwrap();

        assert_eq!(
            find_mfa_serial(&default, None).unwrap(),
            "arn:aws:iam::123456789012:mfa/default"
        );
        assert_eq!(
            find_mfa_serial(&default, Some("arn:override")).unwrap(),
            "arn:override"
        );
        assert_eq!(find_mfa_serial(&dev, Some("device")).unwrap(), "device");
        assert!(matches!(
            find_mfa_serial(&dev, None).unwrap_err(),
            Error::NoMfaDeviceFound(name) if name == "dev"
        ));
    }

    #[test]
    fn test_long_term_credentials() {
        let store = store(
            "[ok]\naws_access_key_id = A\naws_secret_access_key = S\n\n[nokey]\naws_secret_access_key = S\n\n[nosecret]\naws_access_key_id = A\n",
        );

        let credentials = long_term_credentials(&store.resolve("ok").unwrap()).unwrap();
        assert_eq!(credentials.access_key_id, "A");
        assert_eq!(credentials.secret_access_key, "S");

        assert!(matches!(
            long_term_credentials(&store.resolve("nokey").unwrap()).unwrap_err(),
            Error::NoAccessKey(_)
        ));
        assert!(matches!(
            long_term_credentials(&store.resolve("nosecret").unwrap()).unwrap_err(),
            Error::NoSecretKey(_)
        ));
    }

    #[test]
    fn test_upsert_short_term_appends_profile() {
        let mut store = store(STORE);
        let name = store.upsert_short_term("default", &temporary(None));

        assert_eq!(name, "default-short-term");
        assert_eq!(
            store.serialize(),
            format!(
                "{STORE}\n[default-short-term]\naws_access_key_id = ASIATEMP\naws_secret_access_key = temp-secret\naws_session_token = temp-token\nexpiration = 2100-01-01T00:00:00Z\n"
            )
        );
    }

    #[test]
    fn test_upsert_short_term_with_role() {
        let mut store = store(STORE);
        let role = AssumedRole {
            arn: "arn:aws:iam::123456789012:role/admin".to_string(),
            id: Some("AROAEXAMPLE:mfaws".to_string()),
        };
        store.upsert_short_term("dev", &temporary(Some(role)));

        let profile = store.resolve("dev-short-term").unwrap();
        assert_eq!(
            profile.get(ASSUMED_ROLE_ARN),
            Some("arn:aws:iam::123456789012:role/admin")
        );
        assert_eq!(profile.get(ASSUMED_ROLE_ID), Some("AROAEXAMPLE:mfaws"));
    }

    #[test]
    fn test_upsert_short_term_replaces_in_place() {
        let text = "[default-short-term]\naws_access_key_id = OLD\nassumed_role_arn = arn:old\nexpiration = 2000-01-01T00:00:00Z\n\n[default]\naws_access_key_id = A\n";
        let mut store = store(text);
        store.upsert_short_term("default", &temporary(None));

        assert_eq!(
            store.serialize(),
            "[default-short-term]\naws_access_key_id = ASIATEMP\naws_secret_access_key = temp-secret\naws_session_token = temp-token\nexpiration = 2100-01-01T00:00:00Z\n\n[default]\naws_access_key_id = A\n"
        );
    }

    #[test]
    fn test_upsert_short_term_collapses_duplicates() {
        let text = "[a-short-term]\nx = 1\n\n[a]\nk = v\n\n[a-short-term]\nx = 2\n";
        let mut store = store(text);
        store.upsert_short_term("a", &temporary(None));

        assert_eq!(store.list_short_term_profiles().len(), 1);
        assert!(store.resolve("a-short-term").is_ok());
        assert_eq!(store.list_base_profiles(), vec!["a"]);
    }

    #[test]
    fn test_upsert_short_term_twice_is_idempotent() {
        let mut store = store(STORE);
        store.upsert_short_term("default", &temporary(None));
        let once = store.serialize();
        store.upsert_short_term("default", &temporary(None));
        assert_eq!(store.serialize(), once);
    }

    #[test]
    fn test_list_profiles() {
        let mut store = store(STORE);
        store.upsert_short_term("dev", &temporary(None));

        assert_eq!(store.list_base_profiles(), vec!["default", "dev"]);
        let short_term: Vec<&str> = store
            .list_short_term_profiles()
            .iter()
            .map(|profile| profile.name())
            .collect();
        assert_eq!(short_term, vec!["dev-short-term"]);
    }

    #[test]
    fn test_delete_short_term_profiles() {
        let mut store = store(STORE);
        assert_eq!(store.delete_short_term_profiles(), 0);
        assert_eq!(store.serialize(), STORE);

        store.upsert_short_term("default", &temporary(None));
        store.upsert_short_term("dev", &temporary(None));
        assert_eq!(store.delete_short_term_profiles(), 2);
        assert_eq!(store.serialize(), STORE);
    }
}
