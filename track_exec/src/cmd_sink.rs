//! # Command sink
//!
//! The boundary through which demands leave the tracker. The executable sends demands to the
//! vehicle bridge over the network, see [`crate::veh_client::VehClient`].

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use comms_if::eqpt::RcDems;

// ------------------------------------------------------------------------------------------------
// TRAITS
// ------------------------------------------------------------------------------------------------

/// Something demands can be sent to.
pub trait CommandSink {
    type Error;

    /// Send one set of demands to the vehicle.
    fn send_dems(&mut self, dems: &RcDems) -> Result<(), Self::Error>;
}

// ------------------------------------------------------------------------------------------------
// TEST SINKS
// ------------------------------------------------------------------------------------------------

#[cfg(test)]
pub(crate) mod test_sinks {
    use super::*;

    /// Records every demand it is sent.
    #[derive(Debug, Default)]
    pub struct RecordingSink {
        pub sent: Vec<RcDems>,
    }

    impl CommandSink for RecordingSink {
        type Error = std::convert::Infallible;

        fn send_dems(&mut self, dems: &RcDems) -> Result<(), Self::Error> {
            self.sent.push(*dems);
            Ok(())
        }
    }

    /// Fails every send, counting the attempts.
    #[derive(Debug, Default)]
    pub struct FailingSink {
        pub attempts: usize,
    }

    #[derive(Debug, PartialEq, Eq)]
    pub struct SinkDown;

    impl CommandSink for FailingSink {
        type Error = SinkDown;

        fn send_dems(&mut self, _dems: &RcDems) -> Result<(), Self::Error> {
            self.attempts += 1;
            Err(SinkDown)
        }
    }
}
