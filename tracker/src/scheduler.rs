//! The periodic sample and send cycle.
//!
//! The scheduler waits for either the interval timer or an inbound datagram. Inbound datagrams
//! are drained and discarded, the timer is always checked afterwards within the same wakeup. On
//! expiry the position is advanced, a record is built and sent, and the timer is re-armed one
//! interval later. Missed intervals are skipped rather than sent as a backlog.

use crate::{
    position::PositionModel,
    routing::{self, RoutingMetricsSource},
    transport::Transport,
};
use pasture_protocol::{
    collect_view::CLOCK_SECOND, next_seqno, CollectViewMessage, Position, TelemetryRecord,
};
use std::time::Duration;
use tokio::time::{sleep_until, Instant};
use tracing::{debug, error, info, warn};

const RX_BUFFER_SIZE: usize = 128;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    Idle,
    Sending,
}

/// What woke the scheduler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Wakeup {
    Inbound,
    TimerExpired,
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Statistics {
    pub sent: usize,
    /// Ticks where no transport endpoint existed.
    pub skipped: usize,
    pub failed: usize,
    pub inbound_discarded: usize,
}

/// Everything carried from one tick to the next.
#[derive(Debug, Clone)]
pub struct TelemetryState {
    model: PositionModel,
    seqno: u8,
}

impl TelemetryState {
    pub fn new(node_identity: u16) -> Self {
        Self {
            model: PositionModel::new(node_identity),
            seqno: pasture_protocol::record::SEQNO_NEVER_SENT,
        }
    }

    pub fn position(&self) -> Position {
        self.model.position()
    }

    /// Sequence number of the last record built.
    pub fn seqno(&self) -> u8 {
        self.seqno
    }

    pub fn advance_position(&mut self) -> Position {
        self.model.advance()
    }

    /// Builds the record for the current position, consuming a sequence number.
    pub fn next_record<R: RoutingMetricsSource + ?Sized>(
        &mut self,
        routing: &R,
        clock: u16,
    ) -> Result<TelemetryRecord, pasture_protocol::Error> {
        let metrics = routing::sample(routing);
        let seqno = next_seqno(self.seqno);

        let record = TelemetryRecord::encode(
            seqno,
            &CollectViewMessage::new(metrics, clock),
            self.position(),
        )?;

        self.seqno = seqno;
        Ok(record)
    }
}

/// Node clock in 1/128 second ticks, wrapping at 16 bits.
fn clock_ticks(uptime: Duration) -> u16 {
    (uptime.as_millis() * u128::from(CLOCK_SECOND) / 1000) as u16
}

/// First expiry after `now` on the schedule `deadline + k * interval`, skipping missed intervals.
///
/// Returns `None` when that instant cannot be represented.
fn next_deadline(deadline: Instant, interval: Duration, now: Instant) -> Option<Instant> {
    let next = deadline.checked_add(interval)?;
    if next > now {
        return Some(next);
    }

    let behind = now - next;
    let missed = u32::try_from(behind.as_nanos() / interval.as_nanos())
        .unwrap_or(u32::MAX)
        .saturating_add(1);
    warn!("Scheduler stalled, skipping {} intervals", missed);

    next.checked_add(interval.checked_mul(missed)?)
}

pub struct Scheduler<T, R> {
    transport: Option<T>,
    routing: R,
    telemetry: TelemetryState,
    interval: Duration,
    started: Instant,
    /// `None` once the next expiry is out of range, no further records are sent.
    deadline: Option<Instant>,
    state: State,
    stats: Statistics,
    rx_buffer: [u8; RX_BUFFER_SIZE],
}

impl<T: Transport, R: RoutingMetricsSource> Scheduler<T, R> {
    /// Creates a scheduler whose first expiry is one interval from now.
    pub fn new(
        telemetry: TelemetryState,
        routing: R,
        transport: Option<T>,
        interval: Duration,
    ) -> Result<Self, crate::Error> {
        if interval.is_zero() {
            return Err(crate::Error::InvalidInterval);
        }

        let now = Instant::now();
        let deadline = now
            .checked_add(interval)
            .ok_or(crate::Error::InvalidInterval)?;

        Ok(Self {
            transport,
            routing,
            telemetry,
            interval,
            started: now,
            deadline: Some(deadline),
            state: State::Idle,
            stats: Statistics::default(),
            rx_buffer: [0; RX_BUFFER_SIZE],
        })
    }

    pub fn attach_transport(&mut self, transport: T) {
        self.transport.replace(transport);
    }

    pub fn state(&self) -> State {
        self.state
    }

    pub fn statistics(&self) -> &Statistics {
        &self.stats
    }

    pub fn telemetry(&self) -> &TelemetryState {
        &self.telemetry
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    pub async fn run(mut self) {
        loop {
            self.poll().await;
        }
    }

    /// Waits for and handles a single wakeup.
    pub async fn poll(&mut self) -> Wakeup {
        let deadline = self.deadline;
        let expiry = async {
            match deadline {
                Some(deadline) => sleep_until(deadline).await,
                None => std::future::pending().await,
            }
        };

        let (wakeup, received) = match self.transport.as_mut() {
            Some(transport) => tokio::select! {
                biased;
                received = transport.receive(&mut self.rx_buffer) => (Wakeup::Inbound, Some(received)),
                _ = expiry => (Wakeup::TimerExpired, None),
            },
            None => {
                expiry.await;
                (Wakeup::TimerExpired, None)
            }
        };

        match received {
            Some(Ok(len)) => {
                debug!("Discarding {} inbound bytes", len);
                self.stats.inbound_discarded += 1;
            }
            Some(Err(e)) => warn!("Receive failed: {e}"),
            None => {}
        }

        let now = Instant::now();
        if self.deadline.is_some_and(|deadline| now >= deadline) {
            self.state = State::Sending;
            self.tick().await;
            self.rearm(now);
            self.state = State::Idle;
        }

        wakeup
    }

    async fn tick(&mut self) {
        let position = self.telemetry.advance_position();

        let Some(transport) = self.transport.as_mut() else {
            debug!("No transport endpoint, skipping send");
            self.stats.skipped += 1;
            return;
        };

        let clock = clock_ticks(self.started.elapsed());

        match self.telemetry.next_record(&self.routing, clock) {
            Ok(record) => match transport.transmit(record.as_bytes()).await {
                Ok(()) => {
                    info!("Sent telemetry {}: {}", record.seqno(), position);
                    self.stats.sent += 1;
                }
                Err(e) => {
                    warn!("Failed to send telemetry {}: {e}", record.seqno());
                    self.stats.failed += 1;
                }
            },
            Err(e) => {
                warn!("Failed to build telemetry record: {e}");
                self.stats.failed += 1;
            }
        }

        debug!("Statistics: {:?}", self.stats);
    }

    fn rearm(&mut self, now: Instant) {
        self.deadline = self
            .deadline
            .and_then(|deadline| next_deadline(deadline, self.interval, now));

        if self.deadline.is_none() {
            error!("Next send time is out of range, no further records will be sent");
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{
        routing::{Dag, PreferredParent, RplState},
        transport::tokio_channels::ChannelTransport,
    };
    use pasture_protocol::{LinkId, RoutingMetrics};

    const INTERVAL: Duration = Duration::from_secs(30);
    const NODE: u16 = 0x0102;

    fn scheduler(
        transport: Option<ChannelTransport>,
        routing: RplState,
    ) -> Scheduler<ChannelTransport, RplState> {
        Scheduler::new(TelemetryState::new(NODE), routing, transport, INTERVAL).unwrap()
    }

    fn assert_elapsed(start: Instant, expected: Duration) {
        let elapsed = start.elapsed();
        assert!(
            elapsed >= expected && elapsed < expected + Duration::from_millis(10),
            "elapsed {elapsed:?}, expected {expected:?}"
        );
    }

    #[test]
    fn clock() {
        assert_eq!(clock_ticks(Duration::from_secs(30)), 3840);
        assert_eq!(clock_ticks(Duration::from_millis(500)), 64);
        assert_eq!(clock_ticks(Duration::from_secs(512)), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn zero_interval() {
        assert!(matches!(
            Scheduler::<ChannelTransport, _>::new(
                TelemetryState::new(NODE),
                RplState::default(),
                None,
                Duration::ZERO
            ),
            Err(crate::Error::InvalidInterval)
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn interval_beyond_clock_range() {
        assert!(matches!(
            Scheduler::<ChannelTransport, _>::new(
                TelemetryState::new(NODE),
                RplState::default(),
                None,
                Duration::from_secs(u64::MAX)
            ),
            Err(crate::Error::InvalidInterval)
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn next_deadline_skips_missed_intervals() {
        let start = Instant::now();

        assert_eq!(
            next_deadline(start, INTERVAL, start + Duration::from_secs(1)),
            Some(start + INTERVAL)
        );
        assert_eq!(
            next_deadline(start, INTERVAL, start + INTERVAL),
            Some(start + INTERVAL * 2)
        );
        assert_eq!(
            next_deadline(start, INTERVAL, start + Duration::from_secs(95)),
            Some(start + INTERVAL * 4)
        );
    }

    #[tokio::test(start_paused = true)]
    async fn next_deadline_out_of_range() {
        let start = Instant::now();
        assert_eq!(next_deadline(start, Duration::MAX, start), None);
    }

    #[tokio::test(start_paused = true)]
    async fn one_record_per_interval() {
        let (t1, mut t2) = ChannelTransport::new_pair(8);
        let start = Instant::now();
        let mut scheduler = scheduler(Some(t1), RplState::default());

        for expected in 1..=3u8 {
            assert_eq!(scheduler.poll().await, Wakeup::TimerExpired);
            assert_eq!(scheduler.state(), State::Idle);
            assert_elapsed(start, INTERVAL * u32::from(expected));

            let datagram = t2.try_receive().unwrap();
            assert_eq!(datagram[0], expected);
            assert_eq!(t2.try_receive(), None);
        }

        assert_eq!(scheduler.statistics().sent, 3);
    }

    #[tokio::test(start_paused = true)]
    async fn record_contents() {
        let (t1, mut t2) = ChannelTransport::new_pair(8);
        let routing = RplState {
            dag: Some(Dag {
                rank: 512,
                dio_interval_doublings: 12,
                preferred_parent: Some(PreferredParent {
                    address: "aaaa::212:7401:1:101".parse().unwrap(),
                    rank: 256,
                }),
            }),
            neighbors: 2,
        };
        let mut scheduler = scheduler(Some(t1), routing);

        scheduler.poll().await;

        let datagram = t2.try_receive().unwrap();
        assert_eq!(datagram.len(), 54);
        assert_eq!(datagram[1], 0);

        let record = TelemetryRecord::decode::<CollectViewMessage>(&datagram).unwrap();
        assert_eq!(record.seqno, 1);
        assert_eq!(
            record.position,
            Position::new(-8_055_961 - 33, -34_951_469 + 60)
        );
        assert_eq!(record.blob.clock, 3840);
        assert_eq!(
            record.blob.routing,
            RoutingMetrics {
                parent: LinkId([0x01, 0x01]),
                parent_etx: 128,
                rank: 512,
                num_neighbors: 2,
                beacon_interval_seconds: 8,
            }
        );
    }

    #[tokio::test(start_paused = true)]
    async fn no_topology_still_sends() {
        let (t1, mut t2) = ChannelTransport::new_pair(8);
        let mut scheduler = scheduler(Some(t1), RplState::default());

        scheduler.poll().await;

        let datagram = t2.try_receive().unwrap();
        let record = TelemetryRecord::decode::<CollectViewMessage>(&datagram).unwrap();
        assert_eq!(record.blob.routing, RoutingMetrics::default());
    }

    #[tokio::test(start_paused = true)]
    async fn inbound_is_discarded() {
        let (t1, mut t2) = ChannelTransport::new_pair(8);
        let start = Instant::now();
        let mut scheduler = scheduler(Some(t1), RplState::default());

        t2.transmit(b"reboot").await.unwrap();
        t2.transmit(b"reboot").await.unwrap();

        assert_eq!(scheduler.poll().await, Wakeup::Inbound);
        assert_eq!(scheduler.poll().await, Wakeup::Inbound);
        assert_eq!(t2.try_receive(), None);
        assert_eq!(scheduler.statistics().inbound_discarded, 2);
        assert_eq!(scheduler.telemetry().seqno(), 0);

        assert_eq!(scheduler.poll().await, Wakeup::TimerExpired);
        assert_elapsed(start, INTERVAL);
        assert_eq!(t2.try_receive().unwrap()[0], 1);
    }

    #[tokio::test(start_paused = true)]
    async fn timer_checked_after_inbound() {
        let (t1, mut t2) = ChannelTransport::new_pair(8);
        let mut scheduler = scheduler(Some(t1), RplState::default());

        tokio::time::advance(INTERVAL + Duration::from_secs(1)).await;
        t2.transmit(b"ping").await.unwrap();

        assert_eq!(scheduler.poll().await, Wakeup::Inbound);
        assert_eq!(scheduler.statistics().inbound_discarded, 1);
        assert_eq!(scheduler.statistics().sent, 1);
        assert_eq!(t2.try_receive().unwrap()[0], 1);
        assert_eq!(t2.try_receive(), None);
    }

    #[tokio::test(start_paused = true)]
    async fn no_transport_skips_send() {
        let mut scheduler = scheduler(None, RplState::default());
        let initial = scheduler.telemetry().position();

        assert_eq!(scheduler.poll().await, Wakeup::TimerExpired);
        assert_eq!(scheduler.statistics().skipped, 1);
        assert_eq!(scheduler.telemetry().seqno(), 0);
        assert_ne!(scheduler.telemetry().position(), initial);

        let (t1, mut t2) = ChannelTransport::new_pair(8);
        scheduler.attach_transport(t1);

        assert_eq!(scheduler.poll().await, Wakeup::TimerExpired);
        assert_eq!(t2.try_receive().unwrap()[0], 1);
        assert_eq!(scheduler.statistics().sent, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn stall_does_not_send_backlog() {
        let (t1, mut t2) = ChannelTransport::new_pair(8);
        let start = Instant::now();
        let mut scheduler = scheduler(Some(t1), RplState::default());

        scheduler.poll().await;
        assert_eq!(t2.try_receive().unwrap()[0], 1);

        // Stall through the 60s and 90s expiries
        tokio::time::advance(Duration::from_secs(95)).await;

        assert_eq!(scheduler.poll().await, Wakeup::TimerExpired);
        assert_eq!(t2.try_receive().unwrap()[0], 2);
        assert_eq!(t2.try_receive(), None);
        assert_eq!(
            scheduler.deadline().map(|deadline| deadline - start),
            Some(Duration::from_secs(150))
        );

        assert_eq!(scheduler.poll().await, Wakeup::TimerExpired);
        assert_elapsed(start, Duration::from_secs(150));
        assert_eq!(t2.try_receive().unwrap()[0], 3);
        assert_eq!(scheduler.statistics().sent, 3);
    }

    #[tokio::test(start_paused = true)]
    async fn transmit_failure_is_not_fatal() {
        let (t1, t2) = ChannelTransport::new_pair(8);
        let mut scheduler = scheduler(Some(t1), RplState::default());
        drop(t2);

        assert_eq!(scheduler.poll().await, Wakeup::TimerExpired);
        assert_eq!(scheduler.poll().await, Wakeup::TimerExpired);

        assert_eq!(scheduler.statistics().failed, 2);
        assert_eq!(scheduler.statistics().sent, 0);
        assert_eq!(scheduler.telemetry().seqno(), 2);
    }
}
