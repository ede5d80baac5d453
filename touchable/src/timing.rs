//! Rollover-safe arithmetic over a free-running, wrapping microsecond counter.
//!
//! Counter values are never compared with `<` or `>` directly. Every comparison
//! goes through [`elapsed`], which is correct across a wraparound as long as the
//! real interval is shorter than the full counter range.

/// Forward time from `start` to `now`
#[inline]
pub fn elapsed(start: u32, now: u32) -> u32 {
    now.wrapping_sub(start)
}

/// Counter value at which a window of `duration` starting at `start` ends
#[inline]
pub fn deadline(start: u32, duration: u32) -> u32 {
    start.wrapping_add(duration)
}

/// Returns true once at least `duration` has passed since `start`
#[inline]
pub fn reached(start: u32, now: u32, duration: u32) -> bool {
    elapsed(start, now) >= duration
}

/// Returns true if the window starting at `start` wraps past the counter maximum.
///
/// Only informational: [`reached`] stays correct either way.
#[inline]
pub fn straddles_rollover(start: u32, duration: u32) -> bool {
    start.checked_add(duration).is_none()
}

/// A free-running microsecond counter that wraps at `u32::MAX`
pub trait MicrosClock {
    fn now(&mut self) -> u32;
}

impl<F: FnMut() -> u32> MicrosClock for F {
    fn now(&mut self) -> u32 {
        self()
    }
}

/// Microsecond clock derived from the Cortex-M DWT cycle counter.
///
/// The cycle counter wraps far sooner than a microsecond counter would, so the
/// clock accumulates microseconds itself. Intervals are exact as long as `now()`
/// is called at least once per cycle counter wrap while a measurement is running.
#[cfg(feature = "dwt-clock")]
pub struct DwtClock {
    cycles_per_us: u32,
    last_cycles: u32,
    residue: u32,
    micros: u32,
}

#[cfg(feature = "dwt-clock")]
impl DwtClock {
    pub fn new(dwt: &mut cortex_m::peripheral::DWT, dcb: &mut cortex_m::peripheral::DCB, sysclk_hz: u32) -> Self {
        dcb.enable_trace();
        dwt.enable_cycle_counter();
        Self {
            cycles_per_us: (sysclk_hz / 1_000_000).max(1),
            last_cycles: cortex_m::peripheral::DWT::cycle_count(),
            residue: 0,
            micros: 0,
        }
    }
}

#[cfg(feature = "dwt-clock")]
impl MicrosClock for DwtClock {
    fn now(&mut self) -> u32 {
        let cycles = cortex_m::peripheral::DWT::cycle_count();
        let delta = self.residue as u64 + elapsed(self.last_cycles, cycles) as u64;
        self.last_cycles = cycles;
        self.micros = self.micros.wrapping_add((delta / self.cycles_per_us as u64) as u32);
        self.residue = (delta % self.cycles_per_us as u64) as u32;
        self.micros
    }
}
