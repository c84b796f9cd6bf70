//! Address and numbered-range allocation.
//!
//! Every address in the fabric is a pure function of a base network and an
//! integer increment, so repeated runs over the same input always produce
//! the same addressing plan. Numbered resources (interfaces, port-channels,
//! loopbacks) come out of reserved ranges with statically pinned numbers
//! removed first; callers consume the remaining pool in ascending order.

use std::collections::HashSet;
use std::net::Ipv4Addr;

use ipnet::Ipv4Net;

/// Return the Nth address within a network, counting from the network
/// address itself (index 0). Errors when the index runs past the network.
pub fn host_addr(net: Ipv4Net, index: u32) -> Result<Ipv4Addr, String> {
    let capacity = network_capacity(net);
    if index >= capacity {
        return Err(format!(
            "address index {} out of range for network {} ({} addresses)",
            index, net, capacity
        ));
    }
    let base = u32::from(net.network());
    Ok(Ipv4Addr::from(base + index))
}

/// Nth address of a network rendered with an explicit prefix length
/// (loopbacks are forced to /32, MLAG peer links to /30).
pub fn host_with_prefix(net: Ipv4Net, index: u32, prefix_len: u8) -> Result<String, String> {
    let addr = host_addr(net, index)?;
    Ok(format!("{}/{}", addr, prefix_len))
}

/// Total number of addresses covered by a network.
pub fn network_capacity(net: Ipv4Net) -> u32 {
    match net.prefix_len() {
        0 => u32::MAX,
        len => 1u32 << (32 - len),
    }
}

/// Compute the pool of still-free numbers in a reserved range.
///
/// Pool = `[first, last]` minus every statically assigned number, sorted
/// ascending. Subsequent allocation consumes the pool front-to-back, so
/// the first unnumbered declaration always receives the lowest free number.
pub fn available_numbers(first: u16, last: u16, used: &[u16]) -> Vec<u16> {
    let used: HashSet<u16> = used.iter().copied().collect();
    (first..=last).filter(|n| !used.contains(n)).collect()
}

/// Parse a `"first,last"` reserved-range string into its bounds.
pub fn parse_range(range: &str) -> Result<(u16, u16), String> {
    let (first, last) = range
        .split_once(',')
        .ok_or_else(|| format!("invalid range '{}', expected 'first,last'", range))?;
    let first: u16 = first
        .trim()
        .parse()
        .map_err(|_| format!("invalid range start in '{}'", range))?;
    let last: u16 = last
        .trim()
        .parse()
        .map_err(|_| format!("invalid range end in '{}'", range))?;
    if first > last {
        return Err(format!("range '{}' ends before it starts", range));
    }
    Ok((first, last))
}

/// Parse a `"first-last"` member-port string (MLAG peer link) into its
/// bounds.
pub fn parse_member_range(range: &str) -> Result<(u16, u16), String> {
    let (first, last) = range
        .split_once('-')
        .ok_or_else(|| format!("invalid member range '{}', expected 'first-last'", range))?;
    let first: u16 = first
        .trim()
        .parse()
        .map_err(|_| format!("invalid member range start in '{}'", range))?;
    let last: u16 = last
        .trim()
        .parse()
        .map_err(|_| format!("invalid member range end in '{}'", range))?;
    if first > last {
        return Err(format!("member range '{}' ends before it starts", range));
    }
    Ok((first, last))
}
