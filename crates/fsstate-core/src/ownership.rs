//! Owner and group resolution and application

use std::path::Path;

use crate::error::{Error, Result};

/// A requested `owner:group` pair, as written in a rule.
///
/// Either side may be a name or a numeric ID.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ownership {
    pub owner: String,
    pub group: String,
}

/// An [`Ownership`] whose names have been looked up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedOwnership {
    pub uid: u32,
    pub gid: u32,
    request: Ownership,
}

impl Ownership {
    pub fn new(owner: impl Into<String>, group: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            group: group.into(),
        }
    }

    /// Look up the numeric IDs. `target` only labels the error.
    ///
    /// Resolution is done before the target is touched, so an unknown user
    /// aborts the rule without creating anything.
    pub fn resolve(&self, target: &Path) -> Result<ResolvedOwnership> {
        let uid = sys::lookup_uid(&self.owner).map_err(|reason| self.failure(target, reason))?;
        let gid = sys::lookup_gid(&self.group).map_err(|reason| self.failure(target, reason))?;
        Ok(ResolvedOwnership {
            uid,
            gid,
            request: self.clone(),
        })
    }

    fn failure(&self, target: &Path, reason: String) -> Error {
        Error::Ownership {
            path: target.to_path_buf(),
            owner: self.owner.clone(),
            group: self.group.clone(),
            reason,
        }
    }
}

impl ResolvedOwnership {
    pub fn request(&self) -> &Ownership {
        &self.request
    }

    /// Change ownership of `path` if it differs. Returns whether anything
    /// changed.
    pub fn apply(&self, path: &Path) -> Result<bool> {
        let current = sys::current_ids(path)?;
        if current == (self.uid, self.gid) {
            return Ok(false);
        }
        sys::chown(path, self.uid, self.gid).map_err(|reason| self.request.failure(path, reason))?;
        Ok(true)
    }
}

impl std::fmt::Display for Ownership {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.owner, self.group)
    }
}

#[cfg(unix)]
mod sys {
    use std::os::unix::fs::MetadataExt;
    use std::path::Path;

    use nix::unistd::{Gid, Group, Uid, User};

    use crate::error::{Error, Operation, Result};

    pub fn lookup_uid(owner: &str) -> std::result::Result<u32, String> {
        if let Ok(id) = owner.parse::<u32>() {
            return Ok(id);
        }
        match User::from_name(owner) {
            Ok(Some(user)) => Ok(user.uid.as_raw()),
            Ok(None) => Err(format!("unknown user {owner:?}")),
            Err(errno) => Err(format!("lookup of user {owner:?} failed: {errno}")),
        }
    }

    pub fn lookup_gid(group: &str) -> std::result::Result<u32, String> {
        if let Ok(id) = group.parse::<u32>() {
            return Ok(id);
        }
        match Group::from_name(group) {
            Ok(Some(group)) => Ok(group.gid.as_raw()),
            Ok(None) => Err(format!("unknown group {group:?}")),
            Err(errno) => Err(format!("lookup of group {group:?} failed: {errno}")),
        }
    }

    pub fn current_ids(path: &Path) -> Result<(u32, u32)> {
        let meta =
            std::fs::metadata(path).map_err(|e| Error::os(path, Operation::ChangeOwner, e))?;
        Ok((meta.uid(), meta.gid()))
    }

    pub fn chown(path: &Path, uid: u32, gid: u32) -> std::result::Result<(), String> {
        nix::unistd::chown(path, Some(Uid::from_raw(uid)), Some(Gid::from_raw(gid)))
            .map_err(|errno| errno.to_string())
    }
}

#[cfg(not(unix))]
mod sys {
    use std::path::Path;

    use crate::error::Result;

    const UNSUPPORTED: &str = "ownership changes are not supported on this platform";

    pub fn lookup_uid(_owner: &str) -> std::result::Result<u32, String> {
        Err(UNSUPPORTED.to_string())
    }

    pub fn lookup_gid(_group: &str) -> std::result::Result<u32, String> {
        Err(UNSUPPORTED.to_string())
    }

    pub fn current_ids(_path: &Path) -> Result<(u32, u32)> {
        Ok((u32::MAX, u32::MAX))
    }

    pub fn chown(_path: &Path, _uid: u32, _gid: u32) -> std::result::Result<(), String> {
        Err(UNSUPPORTED.to_string())
    }
}
