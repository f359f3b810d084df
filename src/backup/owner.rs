//! Owning-account inference from a manifest logical path
//!
//! Layouts seen in backups:
//! - `Documents/<owner>/DB/<file>.sqlite` for databases
//! - `Documents/<owner>/<file>.sqlite` for some older databases
//! - `Documents/<owner>/Audio/<chat>/<id>.aud` for voice notes
//!
//! Anything else maps to [`UNKNOWN_OWNER`]. These layouts come from observed
//! backups, not from any published format.

/// Sentinel owner for paths that match no known layout
pub const UNKNOWN_OWNER: &str = "unknown";

/// Owner of a database file
pub fn database_owner(relative_path: &str) -> String {
    let parts: Vec<&str> = components(relative_path);

    if let Some(idx) = parts.iter().position(|p| *p == "DB") {
        if idx > 0 {
            return parts[idx - 1].to_string();
        }
    } else if parts.len() >= 3 && parts[0] == "Documents" {
        return parts[1].to_string();
    }

    UNKNOWN_OWNER.to_string()
}

/// Owner of a media file
pub fn media_owner(relative_path: &str) -> String {
    let parts: Vec<&str> = components(relative_path);

    parts
        .iter()
        .position(|p| *p == "Documents")
        .filter(|idx| parts.len() > idx + 2)
        .map(|idx| parts[idx + 1].to_string())
        .unwrap_or_else(|| UNKNOWN_OWNER.to_string())
}

fn components(path: &str) -> Vec<&str> {
    path.split('/').filter(|p| !p.is_empty()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_database_owner_layouts() {
        assert_eq!(database_owner("Documents/a1b2/DB/message_1.sqlite"), "a1b2");
        assert_eq!(database_owner("Documents/a1b2/MM.sqlite"), "a1b2");
        assert_eq!(database_owner("DB/MM.sqlite"), UNKNOWN_OWNER);
        assert_eq!(database_owner("Library/MM.sqlite"), UNKNOWN_OWNER);
    }

    #[test]
    fn test_media_owner_layouts() {
        assert_eq!(media_owner("Documents/a1b2/Audio/c3/17.aud"), "a1b2");
        assert_eq!(media_owner("Documents/a1b2/17.aud"), "a1b2");
        assert_eq!(media_owner("Documents/17.aud"), UNKNOWN_OWNER);
        assert_eq!(media_owner("tmp/17.aud"), UNKNOWN_OWNER);
    }
}
