//! Zone authority check.

/// Whether a name, given as its lowercase labels, falls under one of the
/// configured `zones`.
///
/// A zone matches when its labels are a proper suffix of the name's labels,
/// so a name equal to the bare zone apex does not match. Zones are compared
/// exactly as configured. The root zone `.` has no labels to match and
/// therefore matches nothing.
pub fn is_authoritative<L, S>(labels: &[L], zones: &[S]) -> bool
where
    L: AsRef<[u8]>,
    S: AsRef<str>,
{
    zones.iter().any(|zone| {
        let zone = zone.as_ref();
        if zone.is_empty() || zone == "." {
            return false;
        }

        let zone_labels: Vec<&str> = zone.split('.').collect();
        if labels.len() <= zone_labels.len() {
            return false;
        }

        labels[labels.len() - zone_labels.len()..]
            .iter()
            .zip(&zone_labels)
            .all(|(label, zone_label)| label.as_ref() == zone_label.as_bytes())
    })
}
