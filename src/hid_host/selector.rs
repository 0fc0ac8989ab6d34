//! Candidate selection over one discovery window.
//!
//! The window maps address → latest sighting.  Re-discovery overwrites
//! the signal strength (last-seen-wins: RSSI drifts, the newest sample
//! is the one that counts) but keeps the first-seen timestamp, which
//! breaks ties when the window closes.

use heapless::{String, Vec};

use crate::config::{MAX_DISCOVERED, NAME_CAPACITY};
use crate::radio::BdAddr;

/// A device seen during the current discovery window.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DiscoveredDevice {
    pub address: BdAddr,
    /// Advertised name, empty if none was seen yet.
    pub name: String<NAME_CAPACITY>,
    /// Received Signal Strength Indicator (dBm), latest reading.
    pub rssi: i8,
    /// Time of the first sighting in this window (ms).
    pub first_seen_ms: u64,
    /// Time of the latest sighting (ms).
    pub last_seen_ms: u64,
}

impl DiscoveredDevice {
    pub fn new(address: BdAddr, name: String<NAME_CAPACITY>, rssi: i8, seen_ms: u64) -> Self {
        Self {
            address,
            name,
            rssi,
            first_seen_ms: seen_ms,
            last_seen_ms: seen_ms,
        }
    }

    /// `true` if `self` should win the selection over `other`.
    fn beats(&self, other: &DiscoveredDevice) -> bool {
        self.rssi > other.rssi
            || (self.rssi == other.rssi && self.first_seen_ms < other.first_seen_ms)
    }
}

/// Lifecycle of a discovery window.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum WindowState {
    /// No scan has started yet.
    Idle,
    /// Accepting sightings.
    Scanning,
    /// Selection made; sightings are rejected until the next scan.
    Closed,
}

/// Devices seen since the last scan start.
#[derive(Clone, Debug)]
pub struct DiscoveryWindow {
    devices: Vec<DiscoveredDevice, MAX_DISCOVERED>,
    state: WindowState,
}

impl Default for DiscoveryWindow {
    fn default() -> Self {
        Self::new()
    }
}

impl DiscoveryWindow {
    pub const fn new() -> Self {
        Self {
            devices: Vec::new(),
            state: WindowState::Idle,
        }
    }

    pub fn state(&self) -> WindowState {
        self.state
    }

    pub fn devices(&self) -> &[DiscoveredDevice] {
        &self.devices
    }

    pub fn len(&self) -> usize {
        self.devices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.devices.is_empty()
    }

    pub fn get(&self, address: &BdAddr) -> Option<&DiscoveredDevice> {
        self.devices.iter().find(|d| d.address == *address)
    }

    fn reset(&mut self, state: WindowState) {
        self.devices.clear();
        self.state = state;
    }

    /// Insert or update a sighting.
    ///
    /// A new address arriving at a full window takes the place of the
    /// weakest entry if it beats it; otherwise it is rejected.
    fn upsert(&mut self, device: DiscoveredDevice) -> Upsert {
        if let Some(existing) = self
            .devices
            .iter_mut()
            .find(|d| d.address == device.address)
        {
            existing.rssi = device.rssi;
            existing.last_seen_ms = device.last_seen_ms;
            if !device.name.is_empty() {
                existing.name = device.name;
            }
            return Upsert::Updated;
        }

        if !self.devices.is_full() {
            let _ = self.devices.push(device);
            return Upsert::Inserted;
        }

        match self.weakest() {
            Some(i) if device.beats(&self.devices[i]) => {
                let evicted = self.devices.remove(i).address;
                let _ = self.devices.push(device);
                Upsert::Evicted(evicted)
            }
            _ => Upsert::Rejected,
        }
    }

    /// Index of the entry that would be picked last.
    fn weakest(&self) -> Option<usize> {
        self.devices
            .iter()
            .enumerate()
            .fold(None, |weakest, (i, d)| match weakest {
                Some(w) if d.beats(&self.devices[w]) => Some(w),
                _ => Some(i),
            })
    }

    /// Highest RSSI; ties go to the earliest first sighting, then to
    /// insertion order.
    fn best(&self) -> Option<&DiscoveredDevice> {
        self.devices.iter().fold(None, |best, d| match best {
            Some(b) if !d.beats(b) => Some(b),
            _ => Some(d),
        })
    }
}

/// Outcome of recording a sighting into the window.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Upsert {
    Updated,
    Inserted,
    /// Window was full; the given address made room.
    Evicted(BdAddr),
    Rejected,
}

/// Accumulates one window at a time and makes the one-shot pick.
#[derive(Clone, Debug, Default)]
pub struct CandidateSelector {
    window: DiscoveryWindow,
}

impl CandidateSelector {
    pub const fn new() -> Self {
        Self {
            window: DiscoveryWindow::new(),
        }
    }

    pub fn window(&self) -> &DiscoveryWindow {
        &self.window
    }

    pub fn state(&self) -> WindowState {
        self.window.state()
    }

    pub fn len(&self) -> usize {
        self.window.len()
    }

    pub fn is_empty(&self) -> bool {
        self.window.is_empty()
    }

    /// Start a fresh window, discarding the previous one.
    pub fn open(&mut self) {
        if !self.window.is_empty() {
            debug!("Discarding window with {} devices", self.window.len());
        }
        self.window.reset(WindowState::Scanning);
    }

    /// Record a sighting.  Only accepted while scanning.
    pub fn record(&mut self, device: DiscoveredDevice) -> bool {
        if self.window.state() != WindowState::Scanning {
            trace!("Ignoring sighting of {} outside a scan", device.address);
            return false;
        }

        let address = device.address;
        let rssi = device.rssi;
        match self.window.upsert(device) {
            Upsert::Updated | Upsert::Inserted => {
                debug!("Sighting {} (RSSI {})", address, rssi);
                true
            }
            Upsert::Evicted(weakest) => {
                debug!("Window full - {} (RSSI {}) replaces {}", address, rssi, weakest);
                true
            }
            Upsert::Rejected => {
                warn!("Discovery window full - dropping {}", address);
                false
            }
        }
    }

    /// Close the window and pick the strongest device.
    ///
    /// Returns `None` for an empty window, and for a window that is not
    /// scanning: the pick happens once per window.
    pub fn close(&mut self) -> Option<DiscoveredDevice> {
        if self.window.state() != WindowState::Scanning {
            return None;
        }
        self.window.state = WindowState::Closed;

        let pick = self.window.best().cloned();
        match &pick {
            Some(d) => info!(
                "Selected {} (RSSI {}) out of {} devices",
                d.address,
                d.rssi,
                self.window.len()
            ),
            None => info!("Discovery window closed with no candidates"),
        }
        pick
    }
}
