use std::time::Duration;

use crossbeam_channel::Sender;
use log::{debug, error, trace, warn};

use crate::{
    broadcast::BroadcastReading,
    cancel::CancelToken,
    frame::{ReadBuffer, MESG_FRAME_SIZE},
    message::{ChannelResponseCode, Response},
    transport::Transport,
    Result,
};

pub const READ_BUFFER_SIZE: usize = 64;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum State {
    Running,
    Stopped,
}

/// Pulls frames from the transport and forwards every heart rate broadcast
/// to the consumer until cancelled or the transport fails.
pub struct ReceiveLoop<T: Transport> {
    transport: T,
    cancel: CancelToken,
    readings: Sender<BroadcastReading>,
    read_timeout: Duration,
    state: State,
    buffer: [u8; READ_BUFFER_SIZE],
}

impl<T: Transport> ReceiveLoop<T> {
    pub fn new(
        transport: T,
        cancel: CancelToken,
        readings: Sender<BroadcastReading>,
        read_timeout: Duration,
    ) -> Self {
        ReceiveLoop {
            transport,
            cancel,
            readings,
            read_timeout,
            state: State::Running,
            buffer: [0; READ_BUFFER_SIZE],
        }
    }

    pub fn state(&self) -> State {
        self.state
    }

    /// Run until cancelled (`Ok`) or until a read fails (`Err`). Frames that
    /// fail to decode are dropped. The loop is `Stopped` on return either way.
    pub fn run(&mut self) -> Result<()> {
        while self.state == State::Running {
            if self.cancel.is_cancelled() {
                debug!("Receive loop cancelled");
                self.state = State::Stopped;
                break;
            }
            let len = match self.transport.read(&mut self.buffer, self.read_timeout) {
                Ok(Some(len)) => len,
                Ok(None) => continue,
                Err(e) => {
                    error!("Receive loop stopped: {}", e);
                    self.state = State::Stopped;
                    return Err(e);
                }
            };
            if len < MESG_FRAME_SIZE {
                trace!("Skipping {} byte read", len);
                continue;
            }
            let frames: Vec<_> = ReadBuffer::new(&self.buffer[..len]).collect();
            for frame in frames {
                match Response::from_frame(&frame) {
                    Some(Response::BroadcastData(reading)) => {
                        trace!("{}", reading);
                        if self.readings.send(reading).is_err() {
                            debug!("Reading consumer hung up, stopping receive loop");
                            self.state = State::Stopped;
                            break;
                        }
                    }
                    Some(Response::Startup(reason)) => debug!("Startup: {:?}", reason),
                    Some(Response::ChannelEvent(event)) => {
                        if event.is_rf_event()
                            || event.code == ChannelResponseCode::ResponseNoError
                        {
                            trace!("Channel event: {:x?}", event);
                        } else {
                            warn!(
                                "Channel {} rejected message {:#04x}: {:?}",
                                event.channel, event.message_id, event.code
                            );
                        }
                    }
                    None => trace!("Unhandled frame: {:x?}", frame),
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::cancel::cancellation;
    use crate::error::AntError;
    use crate::frame;
    use crossbeam_channel::unbounded;
    use proptest::prelude::*;
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use std::thread;
    use std::time::Instant;

    /// Serves queued reads, then either times out or fails once drained.
    struct Script {
        reads: Mutex<VecDeque<Vec<u8>>>,
        fail_when_empty: bool,
    }

    impl Script {
        fn new(reads: Vec<Vec<u8>>, fail_when_empty: bool) -> Self {
            Script {
                reads: Mutex::new(reads.into_iter().collect()),
                fail_when_empty,
            }
        }
    }

    impl Transport for Script {
        fn write(&self, bytes: &[u8]) -> Result<usize> {
            Ok(bytes.len())
        }

        fn read(&self, buf: &mut [u8], timeout: Duration) -> Result<Option<usize>> {
            match self.reads.lock().unwrap().pop_front() {
                Some(data) => {
                    buf[..data.len()].copy_from_slice(&data);
                    Ok(Some(data.len()))
                }
                None if self.fail_when_empty => {
                    Err(AntError::UsbDeviceError(rusb::Error::NoDevice))
                }
                None => {
                    thread::sleep(timeout);
                    Ok(None)
                }
            }
        }
    }

    fn hr_frame(beat_count: u8, heart_rate: u8) -> Vec<u8> {
        frame::encode(
            0x4E,
            &[0, 4, 0, 0, 0, 0, 0, 0x34, 0x12, beat_count, heart_rate],
        )
        .unwrap()
    }

    #[test]
    fn cancelled_before_start() {
        let (canceller, token) = cancellation();
        let (tx, _rx) = unbounded();
        let mut rx_loop = ReceiveLoop::new(
            Script::new(vec![], true),
            token,
            tx,
            Duration::from_millis(10),
        );
        canceller.cancel();
        rx_loop.run().unwrap();
        assert_eq!(rx_loop.state(), State::Stopped);
    }

    #[test]
    fn cancel_without_data() {
        let timeout = Duration::from_millis(50);
        let (canceller, token) = cancellation();
        let (tx, _rx) = unbounded();
        let handle = thread::spawn(move || {
            let mut rx_loop = ReceiveLoop::new(Script::new(vec![], false), token, tx, timeout);
            let result = rx_loop.run();
            (result.is_ok(), rx_loop.state())
        });
        thread::sleep(Duration::from_millis(120));
        let cancelled_at = Instant::now();
        canceller.cancel();
        let (ok, state) = handle.join().unwrap();
        assert!(ok);
        assert_eq!(state, State::Stopped);
        // One read timeout plus scheduling slack.
        assert!(cancelled_at.elapsed() < timeout + Duration::from_millis(200));
    }

    #[test]
    fn noise_around_one_frame() {
        let mut mixed = vec![0x13, 0x37, 0xA4, 0xFF, 0x00];
        mixed.extend(hr_frame(42, 70));
        mixed.extend(&[0xA4, 0x02, 0x4E, 0x01]);
        let reads = vec![
            vec![0x01, 0x02],
            vec![0x55, 0xAA, 0x4E, 0x00, 0x10, 0x20, 0x30],
            mixed,
            vec![0xA4, 0x09, 0x4E, 0x00, 0x00, 0x00, 0x00, 0x00],
        ];
        let (_canceller, token) = cancellation();
        let (tx, rx) = unbounded();
        let mut rx_loop =
            ReceiveLoop::new(Script::new(reads, true), token, tx, Duration::from_millis(10));
        match rx_loop.run() {
            Err(AntError::UsbDeviceError(rusb::Error::NoDevice)) => {}
            other => panic!("unexpected result: {:?}", other),
        }
        assert_eq!(rx_loop.state(), State::Stopped);
        let readings: Vec<_> = rx.try_iter().collect();
        assert_eq!(readings.len(), 1);
        assert_eq!(readings[0].heart_rate, 70);
        assert_eq!(readings[0].beat_count, 42);
        assert_eq!(readings[0].event_time, 0x1234);
    }

    #[test]
    fn several_frames_in_one_read() {
        let mut read = hr_frame(1, 60);
        read.extend(frame::encode(0x40, &[0, 1, 0x02]).unwrap());
        read.extend(hr_frame(2, 61));
        let (_canceller, token) = cancellation();
        let (tx, rx) = unbounded();
        let mut rx_loop = ReceiveLoop::new(
            Script::new(vec![read], true),
            token,
            tx,
            Duration::from_millis(10),
        );
        assert!(rx_loop.run().is_err());
        let beats: Vec<u8> = rx.try_iter().map(|r| r.beat_count).collect();
        assert_eq!(beats, vec![1, 2]);
    }

    #[test]
    fn consumer_hang_up_stops_loop() {
        let (_canceller, token) = cancellation();
        let (tx, rx) = unbounded();
        drop(rx);
        let mut rx_loop = ReceiveLoop::new(
            Script::new(vec![hr_frame(1, 60)], true),
            token,
            tx,
            Duration::from_millis(10),
        );
        rx_loop.run().unwrap();
        assert_eq!(rx_loop.state(), State::Stopped);
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(512))]

        #[test]
        fn random_noise_around_one_frame(
            before in proptest::collection::vec(
                proptest::collection::vec(any::<u8>(), 0..=READ_BUFFER_SIZE),
                0..4,
            ),
            after in proptest::collection::vec(any::<u8>(), 0..=(READ_BUFFER_SIZE - 15)),
            beat_count in any::<u8>(),
            heart_rate in any::<u8>(),
        ) {
            let mut with_frame = hr_frame(beat_count, heart_rate);
            with_frame.extend(&after);
            let mut reads = before;
            reads.push(with_frame);
            let (_canceller, token) = cancellation();
            let (tx, rx) = unbounded();
            let mut rx_loop =
                ReceiveLoop::new(Script::new(reads, true), token, tx, Duration::from_millis(1));
            // Only the transport failure at the end of the script stops the loop.
            match rx_loop.run() {
                Err(AntError::UsbDeviceError(rusb::Error::NoDevice)) => {}
                other => prop_assert!(false, "unexpected result: {:?}", other),
            }
            let readings: Vec<_> = rx.try_iter().collect();
            prop_assert_eq!(readings.len(), 1);
            prop_assert_eq!(readings[0].heart_rate, heart_rate);
            prop_assert_eq!(readings[0].beat_count, beat_count);
            prop_assert_eq!(readings[0].event_time, 0x1234);
        }
    }
}
