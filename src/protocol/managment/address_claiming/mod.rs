//! SAE J1939 / NMEA 2000 address-claim algorithm as a polled state machine:
//! emit PGN 60928, listen for conflicts for 250 ms, defend or fall back to
//! the next candidate address.
//!
//! The machine never blocks. The node feeds it every claim seen on the bus
//! and polls it with the current time; it answers with the frames to send.
use embassy_time::{Duration, Instant};

use crate::core::{BROADCAST_ADDRESS, NULL_ADDRESS};
use crate::error::{ExtractionError, FrameBuildError};
use crate::protocol::managment::iso_name::IsoName;
use crate::protocol::transport::can_frame::CanFrame;
use crate::protocol::transport::can_id::CanId;

/// ISO Address Claim.
pub const PGN_ISO_ADDRESS_CLAIM: u32 = 60928;

/// Time a claim must stand unchallenged before the address is ours.
pub const CLAIM_LISTEN_WINDOW: Duration = Duration::from_millis(250);

/// Highest address a node may claim.
const MAX_CLAIMABLE_ADDRESS: u8 = 247;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ClaimState {
    /// No claim sent yet.
    Unclaimed,
    /// Claim for `address` sent at `since`, listening for conflicts.
    Claiming { address: u8, since: Instant },
    /// Address held and defended.
    Claimed(u8),
    /// Every candidate lost; the node only listens.
    CannotClaim,
}

/// Address claim procedure for one NAME.
#[derive(Debug, Clone)]
pub struct AddressClaim {
    name: IsoName,
    preferred_address: u8,
    candidates: AddressClaimIterator,
    state: ClaimState,
}

impl AddressClaim {
    pub fn new(name: IsoName, preferred_address: u8) -> Self {
        Self {
            name,
            preferred_address,
            candidates: AddressClaimIterator::new(
                preferred_address,
                name.is_arbitrary_address_capable(),
            ),
            state: ClaimState::Unclaimed,
        }
    }

    pub fn name(&self) -> IsoName {
        self.name
    }

    pub fn state(&self) -> ClaimState {
        self.state
    }

    /// Address usable as a source, only once the claim has stood.
    pub fn address(&self) -> Option<u8> {
        match self.state {
            ClaimState::Claimed(address) => Some(address),
            _ => None,
        }
    }

    /// (Re)start the procedure from the preferred address.
    pub fn start(&mut self, now: Instant) -> Option<CanFrame> {
        self.candidates =
            AddressClaimIterator::new(self.preferred_address, self.name.is_arbitrary_address_capable());
        self.claim_next(now)
    }

    /// Promote a standing claim once the listen window has elapsed.
    ///
    /// Returns `true` on the transition to `Claimed`.
    pub fn poll(&mut self, now: Instant) -> bool {
        if let ClaimState::Claiming { address, since } = self.state {
            if now.saturating_duration_since(since) >= CLAIM_LISTEN_WINDOW {
                self.state = ClaimState::Claimed(address);
                #[cfg(feature = "defmt")]
                defmt::info!("address {} claimed", address);
                return true;
            }
        }
        false
    }

    /// React to an address claim seen on the bus.
    ///
    /// Returns the frame to send: a defence of our address, a claim for the
    /// next candidate, or a cannot-claim announcement.
    pub fn on_claim(&mut self, frame: &CanFrame, now: Instant) -> Option<CanFrame> {
        let their_name = extract_name_from_claim(frame).ok()?;
        let ours = match self.state {
            ClaimState::Claiming { address, .. } | ClaimState::Claimed(address) => address,
            ClaimState::Unclaimed | ClaimState::CannotClaim => return None,
        };
        if frame.id.source_address() != ours || their_name == self.name {
            return None;
        }

        if self.name.wins_against(their_name) {
            #[cfg(feature = "defmt")]
            defmt::debug!("defending address {}", ours);
            return build_address_claim_frame(self.name, ours).ok();
        }

        #[cfg(feature = "defmt")]
        defmt::warn!("address {} lost to NAME {=u64:#X}", ours, their_name.raw());
        self.claim_next(now)
    }

    /// Answer to an ISO request for PGN 60928: our claim, or a cannot-claim.
    pub fn claim_frame(&self) -> Option<CanFrame> {
        let address = match self.state {
            ClaimState::Claiming { address, .. } | ClaimState::Claimed(address) => address,
            ClaimState::CannotClaim => NULL_ADDRESS,
            ClaimState::Unclaimed => return None,
        };
        build_address_claim_frame(self.name, address).ok()
    }

    fn claim_next(&mut self, now: Instant) -> Option<CanFrame> {
        match self.candidates.next() {
            Some(address) => {
                #[cfg(feature = "defmt")]
                defmt::debug!("claiming address {}", address);
                self.state = ClaimState::Claiming {
                    address,
                    since: now,
                };
                build_address_claim_frame(self.name, address).ok()
            }
            None => {
                #[cfg(feature = "defmt")]
                defmt::warn!("no address left to claim");
                self.state = ClaimState::CannotClaim;
                build_address_claim_frame(self.name, NULL_ADDRESS).ok()
            }
        }
    }
}

//==================================================================================ADDRESS_CLAIM_ITERATOR
/// Candidate addresses following the J1939 rules: preferred first, then the
/// 128-247 range for Arbitrary Address Capable nodes.
#[derive(Debug, Clone)]
struct AddressClaimIterator {
    preferred: u8,
    next_arbitrary: u16,
    state: AddressClaimStep,
    arbitrary_capable: bool,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum AddressClaimStep {
    TryPreferred,
    TryArbitrary,
    Done,
}

impl AddressClaimIterator {
    fn new(preferred_address: u8, arbitrary_capable: bool) -> Self {
        Self {
            preferred: preferred_address,
            next_arbitrary: 128,
            state: AddressClaimStep::TryPreferred,
            arbitrary_capable,
        }
    }
}

impl Iterator for AddressClaimIterator {
    type Item = u8;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            match self.state {
                AddressClaimStep::TryPreferred => {
                    self.state = if self.arbitrary_capable {
                        AddressClaimStep::TryArbitrary
                    } else {
                        AddressClaimStep::Done
                    };
                    if self.preferred <= MAX_CLAIMABLE_ADDRESS {
                        return Some(self.preferred);
                    }
                }
                AddressClaimStep::TryArbitrary => {
                    if self.next_arbitrary > MAX_CLAIMABLE_ADDRESS as u16 {
                        self.state = AddressClaimStep::Done;
                        continue;
                    }
                    let candidate = self.next_arbitrary as u8;
                    self.next_arbitrary += 1;
                    if candidate != self.preferred {
                        return Some(candidate);
                    }
                }
                AddressClaimStep::Done => return None,
            }
        }
    }
}

//==================================================================================ADDRESS_CLAIM_FRAME
/// Claim frame (PGN 60928, priority 6, global destination) for `name`.
pub fn build_address_claim_frame(name: IsoName, address: u8) -> Result<CanFrame, FrameBuildError> {
    let id = CanId::builder(PGN_ISO_ADDRESS_CLAIM, address)
        .to_destination(BROADCAST_ADDRESS)
        .with_priority(6)
        .build()?;
    Ok(CanFrame::new(id, &name.to_claim_payload()))
}

/// NAME carried by an address claim frame.
pub fn extract_name_from_claim(frame: &CanFrame) -> Result<IsoName, ExtractionError> {
    if frame.id.pgn() != PGN_ISO_ADDRESS_CLAIM {
        return Err(ExtractionError::InvalidIncomingFrame);
    }
    IsoName::from_claim_payload(frame.payload())
}
