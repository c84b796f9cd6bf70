//! VLAN range string handling.
//!
//! Trunk allowed-VLAN lists are authored and emitted as compact range
//! strings (`"10,12-14,20"`). `expand` turns a range string into the full
//! sorted list of VLAN numbers; `compact` renders a list back into the
//! shortest range string by grouping maximal runs of consecutive numbers.

/// Expand a VLAN range string into the individual VLAN numbers.
///
/// Accepts comma-separated single numbers and `first-last` ranges.
/// Whitespace around elements is tolerated. Returns an error naming the
/// offending element when a token is not a number or a valid range.
pub fn expand(ranges: &str) -> Result<Vec<u16>, String> {
    let mut vlans = Vec::new();
    for part in ranges.split(',') {
        let part = part.trim();
        if part.is_empty() {
            continue;
        }
        if let Some((first, last)) = part.split_once('-') {
            let first: u16 = first
                .trim()
                .parse()
                .map_err(|_| format!("invalid VLAN range '{}'", part))?;
            let last: u16 = last
                .trim()
                .parse()
                .map_err(|_| format!("invalid VLAN range '{}'", part))?;
            if first > last {
                return Err(format!("invalid VLAN range '{}'", part));
            }
            vlans.extend(first..=last);
        } else {
            let vlan: u16 = part
                .parse()
                .map_err(|_| format!("invalid VLAN number '{}'", part))?;
            vlans.push(vlan);
        }
    }
    vlans.sort_unstable();
    vlans.dedup();
    Ok(vlans)
}

/// Compact a list of VLAN numbers into a range string.
///
/// The input is sorted and deduplicated, so `compact` is insensitive to
/// author ordering. Runs of consecutive numbers render as `first-last`,
/// isolated numbers as themselves, all joined by commas.
pub fn compact(vlans: &[u16]) -> String {
    let mut sorted: Vec<u16> = vlans.to_vec();
    sorted.sort_unstable();
    sorted.dedup();

    let mut parts: Vec<String> = Vec::new();
    let mut iter = sorted.into_iter();
    let Some(first) = iter.next() else {
        return String::new();
    };
    let mut run_start = first;
    let mut run_end = first;
    for vlan in iter {
        if vlan == run_end + 1 {
            run_end = vlan;
        } else {
            parts.push(render_run(run_start, run_end));
            run_start = vlan;
            run_end = vlan;
        }
    }
    parts.push(render_run(run_start, run_end));
    parts.join(",")
}

fn render_run(start: u16, end: u16) -> String {
    if start == end {
        format!("{}", start)
    } else {
        format!("{}-{}", start, end)
    }
}
