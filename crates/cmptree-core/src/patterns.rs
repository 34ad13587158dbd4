//! Built-in exclusion patterns.
//!
//! The standard list covers entries that backup tools deliberately skip on
//! macOS volumes (filesystem implementation details, per-volume preferences,
//! Apple data stores, caches, dynamically generated devices, trash, Time
//! Machine data and a few vendor-specific files). The live-filesystem list
//! adds entries that keep changing on a mounted, running system.
//!
//! Patterns starting with `/` are anchored at the tree root.

const STANDARD_EXCLUDE_PATTERNS: &str = "
# Filesystem implementation details
.HFS+ Private Directory Data*
/.journal
/.journal_info_block
.afpDeleted*
._*
.AppleDouble
.AppleDB
/lost+found
Network Trash Folder
.TemporaryItems
# Volume-specific preferences
.metadata_never_index
.metadata_never_index_unless_rootfs
/.com.apple.timemachine.donotpresent
.VolumeIcon.icns
/System/Library/CoreServices/.disk_label*
/TheVolumeSettingsFolder
/private/var/db/dslocal/nodes/Default/secureaccesstoken.plist
# Apple-proprietary data stores
.DocumentRevisions-V100*
.Spotlight-V100
/.fseventsd
/.hotfiles.btree
/private/var/db/systemstats
/private/var/folders/*/*/C
/private/var/folders/*/*/T
# Volume-specific cache files
/private/var/db/dyld/dyld_*
/System/Library/Caches/com.apple.bootstamps/*
/System/Library/Caches/com.apple.corestorage/*
# NetBoot local data store
/.com.apple.NetBootX
# Dynamically-generated devices
/Volumes/*
/dev/*
/automount
/Network
/.vol/*
/net
# Quota real-time data files
/.quota.user
/.quota.group
# Large datastores that are (or should be) erased on startup
/private/var/vm/*
/private/tmp/*
/cores
/macOS Install Data
# Trash
.Trash
.Trashes
# Time Machine backups
/Backups.backupdb
/.MobileBackups
/.MobileBackups.trash
/private/var/db/com.apple.backupd.backupVerification
# Corrupted iCloud Local Storage
Library/Mobile Documents/*
Library/Mobile Documents.*
.webtmp
# Special files
/private/tmp/kacta.txt
/private/tmp/kactd.txt
/private/var/audit/*.crash_recovery
/private/var/audit/current
/Library/Caches/CrashPlan
/PGPWDE01
/PGPWDE02
/.bzvol
/.cleverfiles
/Library/Application Support/Comodo/AntiVirus/Quarantine
/private/var/spool/qmaster
$Recycle.Bin
Library/Preferences/ByHost/com.apple.loginwindow*
.dropbox.cache
/private/var/db/atpstatdb*
.@__thumb
/.com.prosofteng.DrivePulse.ignore
com.apple.photolibraryd/tmpoutboundsharing
";

const LIVE_FS_EXCLUDE_PATTERNS: &str = "
.DS_Store
/.PKInstallSandboxManager-SystemSoftware
/private/var/spool/postfix
/private/var/folders
/private/var/db
/private/var/log
/private/var/run
Library/Caches
";

/// Parse a pattern list: one pattern per line, blank lines and `#` comments skipped.
pub fn parse_pattern_list(text: &str) -> Vec<String> {
    text.lines()
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(str::to_string)
        .collect()
}

/// The standard backup exclusions.
pub fn standard() -> Vec<String> {
    parse_pattern_list(STANDARD_EXCLUDE_PATTERNS)
}

/// Additional exclusions for comparing against a live (mounted, running) filesystem.
pub fn live_fs() -> Vec<String> {
    parse_pattern_list(LIVE_FS_EXCLUDE_PATTERNS)
}

/// The standard list, followed by the live-filesystem list when requested.
pub fn standard_patterns(live_fs: bool) -> Vec<String> {
    let mut patterns = standard();
    if live_fs {
        patterns.extend(self::live_fs());
    }
    patterns
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_pattern_list() {
        let patterns = parse_pattern_list("\n# comment\n/anchored\nloose*\n\n");
        assert_eq!(patterns, vec!["/anchored", "loose*"]);
    }

    #[test]
    fn test_standard_lists() {
        let standard = standard();
        assert_eq!(standard.first().map(String::as_str), Some(".HFS+ Private Directory Data*"));
        assert!(standard.iter().all(|p| !p.starts_with('#') && !p.is_empty()));
        assert!(standard.iter().any(|p| p == "/lost+found"));

        let combined = standard_patterns(true);
        assert_eq!(combined.len(), standard.len() + live_fs().len());
        assert!(combined.iter().any(|p| p == "Library/Caches"));
    }
}
