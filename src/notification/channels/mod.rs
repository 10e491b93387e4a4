//! 具体渠道实现

pub mod simulated;

pub use simulated::{SimulatedConfig, SimulatedSender};

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notification::model::Channel;
    use crate::notification::sender::Sender;

    #[test]
    fn test_for_channel_binds_single_channel() {
        for channel in Channel::ALL {
            let sender = SimulatedSender::for_channel(channel);
            assert_eq!(sender.channel(), channel);
            assert_eq!(sender.name(), channel.as_str());
            for other in Channel::ALL {
                assert_eq!(sender.supports(other), other == channel);
            }
        }
    }
}
