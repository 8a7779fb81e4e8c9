//! Retention sweeper.
//!
//! Deletes date-stamped top-level folders (`<client>/<YYYY-MM-DD>/...`) that
//! are older than the owning client's effective retention window. Folders
//! whose names do not parse as dates are left untouched.

use std::fs;

use time::{format_description::FormatItem, macros::format_description, Date, OffsetDateTime};
use tracing::{debug, info, instrument, warn};

use crate::{clients::Client, format_bytes, Context};

/// Retention cap applied to every client while storage is critical.
pub const PRESSURE_CAP_DAYS: u32 = 7;

/// Usage percentage above which the cap kicks in.
const PRESSURE_THRESHOLD_PERCENT: f64 = 90.0;

const DATE_FORMAT: &[FormatItem<'static>] = format_description!("[year]-[month]-[day]");

/// Outcome of a sweep.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SweepStats {
    /// Bytes in use before the sweep.
    pub usage_before: u64,
    /// Bytes in use after the sweep.
    pub usage_after: u64,
    /// Number of date folders removed.
    pub removed: usize,
}

/// Effective retention window for a client: its own override if present, the
/// global default otherwise, capped at [`PRESSURE_CAP_DAYS`] while storage
/// is critical.
#[must_use]
pub fn effective_retention(client: &Client, default_days: u32, storage_critical: bool) -> u32 {
    let days = client.retention(default_days);

    if storage_critical {
        days.min(PRESSURE_CAP_DAYS)
    } else {
        days
    }
}

/// Parse a `YYYY-MM-DD` folder name.
pub(crate) fn parse_date_folder(name: &str) -> Option<Date> {
    Date::parse(name, DATE_FORMAT).ok()
}

/// Delete every date folder older than its client's effective retention
/// window. I/O errors on individual entries are logged and skipped; the
/// sweep itself never fails.
#[instrument(skip(ctx))]
pub fn sweep(ctx: &Context) -> SweepStats {
    let local = ctx.storage.local();

    let usage_before = local.usage();
    let percent = local.usage_percent();
    info!(
        "current storage usage: {} ({percent:.1}%)",
        format_bytes(usage_before)
    );

    let critical = percent > PRESSURE_THRESHOLD_PERCENT;
    let clients = ctx.clients.all();
    let default_days = ctx.settings.get().default_retention_days;
    let today = OffsetDateTime::now_utc().date();

    let mut removed = 0;

    let entries = match fs::read_dir(local.root()) {
        Ok(entries) => entries,
        Err(e) => {
            warn!("cannot read upload root: {e}");
            return SweepStats {
                usage_before,
                usage_after: usage_before,
                removed,
            };
        }
    };

    for entry in entries.filter_map(Result::ok) {
        let client_dir = entry.path();

        if !client_dir.is_dir() {
            continue;
        }

        let client_id = entry.file_name().to_string_lossy().into_owned();

        // directories without a metadata record fall back to the default
        let days = clients
            .get(&client_id)
            .map_or_else(
                || {
                    if critical {
                        default_days.min(PRESSURE_CAP_DAYS)
                    } else {
                        default_days
                    }
                },
                |client| effective_retention(client, default_days, critical),
            );

        if critical {
            info!("storage critical ({percent:.1}%), capping retention to {days} days for client {client_id}");
        }

        debug!("checking client {client_id} with retention of {days} days");

        let Ok(folders) = fs::read_dir(&client_dir) else {
            continue;
        };

        for folder in folders.filter_map(Result::ok) {
            let path = folder.path();

            if !path.is_dir() {
                continue;
            }

            let name = folder.file_name().to_string_lossy().into_owned();

            let Some(date) = parse_date_folder(&name) else {
                continue;
            };

            // a folder expires on the day it turns `days` old
            if (today - date).whole_days() >= i64::from(days) {
                info!("deleting expired folder {}", path.display());

                match fs::remove_dir_all(&path) {
                    Ok(()) => removed += 1,
                    Err(e) => warn!("failed to delete {}: {e}", path.display()),
                }
            }
        }
    }

    let usage_after = local.usage();
    info!(
        "sweep complete, removed {removed} folders, storage usage: {} ({:.1}%)",
        format_bytes(usage_after),
        local.usage_percent()
    );

    SweepStats {
        usage_before,
        usage_after,
        removed,
    }
}
