use rand::seq::SliceRandom;
use rand::Rng;
use serenity::model::id::{ChannelId, GuildId};

use super::{GuildQueue, LoopMode, QueueManager, Track};

/// Result of putting tracks in a session.
#[derive(Debug)]
pub struct Enqueued {
    /// 1-based position of the (first) added track among pending tracks.
    /// Zero when the track started playing right away.
    pub position: usize,
    /// Set when the session was idle: the track to start and its generation.
    pub start: Option<(Track, u64)>,
}

#[derive(Debug)]
pub struct Skipped {
    pub skipped: Vec<Track>,
    pub next: Option<(Track, u64)>,
}

impl GuildQueue {
    pub fn enqueue(&mut self, track: Track) -> usize {
        self.tracks.push_back(track);
        self.tracks.len()
    }

    pub fn enqueue_next(&mut self, track: Track) -> usize {
        self.tracks.push_front(track);
        1
    }

    pub fn enqueue_many(&mut self, tracks: impl IntoIterator<Item = Track>) -> usize {
        let before = self.tracks.len();
        self.tracks.extend(tracks);
        self.tracks.len() - before
    }

    /// Puts `tracks` at the front of the pending list, keeping their order.
    pub fn enqueue_many_next(&mut self, tracks: Vec<Track>) -> usize {
        let count = tracks.len();
        for track in tracks.into_iter().rev() {
            self.tracks.push_front(track);
        }
        count
    }

    pub fn is_idle(&self) -> bool {
        self.current.is_none()
    }

    pub fn is_empty(&self) -> bool {
        self.current.is_none() && self.tracks.is_empty()
    }

    /// Moves to the next track according to the repeat mode. A skip always
    /// leaves the current track even when it is on repeat.
    pub fn advance(&mut self, was_skipped: bool) -> Option<Track> {
        self.generation += 1;

        if !was_skipped && self.loop_mode == LoopMode::Song {
            if let Some(current) = &self.current {
                return Some(current.clone());
            }
        }

        if self.loop_mode == LoopMode::Queue {
            if let Some(current) = self.current.take() {
                self.tracks.push_back(current);
            }
        }

        let next = self.tracks.pop_front();
        self.current = next.clone();
        if next.is_none() {
            self.track_handle = None;
        }
        next
    }

    /// Skips the current track and `count - 1` pending ones. Returns `None`
    /// when nothing is playing, leaving the session untouched.
    pub fn skip(&mut self, count: usize) -> Option<Skipped> {
        let current = self.current.clone()?;
        let mut skipped = vec![current];

        let extra = count.max(1).min(self.tracks.len() + 1) - 1;
        for _ in 0..extra {
            let Some(track) = self.tracks.pop_front() else {
                break;
            };
            skipped.push(track);
        }

        // Repeat-all keeps the cycle order: skipped tracks go to the tail as
        // they were played.
        if self.loop_mode == LoopMode::Queue {
            self.current = None;
            self.tracks.extend(skipped.iter().cloned());
        }

        let next = self.advance(true).map(|t| (t, self.generation));
        Some(Skipped { skipped, next })
    }

    /// Handles the end of the track started with `generation`. Returns
    /// `None` for a superseded track, otherwise the advance result.
    pub fn finish(&mut self, generation: u64) -> Option<Option<Track>> {
        if generation != self.generation {
            return None;
        }
        Some(self.advance(false))
    }

    /// Like [`finish`](Self::finish) for a track that could not be played:
    /// it is never repeated.
    pub fn fail(&mut self, generation: u64) -> Option<Option<Track>> {
        if generation != self.generation {
            return None;
        }
        Some(self.advance(true))
    }

    /// Drops pending tracks. The current track keeps playing.
    pub fn clear(&mut self) -> Vec<Track> {
        self.tracks.drain(..).collect()
    }

    /// Forgets everything; the session becomes idle.
    pub fn stop(&mut self) {
        self.tracks.clear();
        self.current = None;
        self.track_handle = None;
        self.announce_channel = None;
        self.generation += 1;
    }

    pub fn shuffle<R: Rng + ?Sized>(&mut self, rng: &mut R) -> usize {
        self.tracks.make_contiguous().shuffle(rng);
        self.tracks.len()
    }

    pub fn remove_at(&mut self, position: usize) -> Option<Track> {
        if position > 0 && position <= self.tracks.len() {
            self.tracks.remove(position - 1)
        } else {
            None
        }
    }

    pub fn set_volume(&mut self, volume: f32) -> f32 {
        self.volume = volume.clamp(0.0, 1.0);
        if let Some(handle) = &self.track_handle {
            let _ = handle.set_volume(self.volume);
        }
        self.volume
    }
}

pub async fn enqueue(manager: &QueueManager, guild_id: GuildId, track: Track) -> Enqueued {
    let mut queues = manager.write().await;
    let queue = queues.entry(guild_id).or_default();
    let position = queue.enqueue(track);
    claim_start(queue, position)
}

pub async fn enqueue_next(manager: &QueueManager, guild_id: GuildId, track: Track) -> Enqueued {
    let mut queues = manager.write().await;
    let queue = queues.entry(guild_id).or_default();
    let position = queue.enqueue_next(track);
    claim_start(queue, position)
}

pub async fn enqueue_many(
    manager: &QueueManager,
    guild_id: GuildId,
    tracks: Vec<Track>,
) -> Enqueued {
    let mut queues = manager.write().await;
    let queue = queues.entry(guild_id).or_default();
    let position = queue.tracks.len() + 1;
    queue.enqueue_many(tracks);
    claim_start(queue, position)
}

pub async fn enqueue_many_next(
    manager: &QueueManager,
    guild_id: GuildId,
    tracks: Vec<Track>,
) -> Enqueued {
    let mut queues = manager.write().await;
    let queue = queues.entry(guild_id).or_default();
    queue.enqueue_many_next(tracks);
    claim_start(queue, 1)
}

fn claim_start(queue: &mut GuildQueue, position: usize) -> Enqueued {
    if queue.is_idle() {
        let start = queue.advance(false).map(|t| (t, queue.generation));
        Enqueued {
            position: 0,
            start,
        }
    } else {
        Enqueued {
            position,
            start: None,
        }
    }
}

pub async fn next_track(
    manager: &QueueManager,
    guild_id: GuildId,
    was_skipped: bool,
) -> Option<(Track, u64)> {
    let mut queues = manager.write().await;
    let queue = queues.entry(guild_id).or_default();
    queue.advance(was_skipped).map(|t| (t, queue.generation))
}

pub async fn skip(manager: &QueueManager, guild_id: GuildId, count: usize) -> Option<Skipped> {
    let mut queues = manager.write().await;
    queues.get_mut(&guild_id).and_then(|q| q.skip(count))
}

pub async fn finish(
    manager: &QueueManager,
    guild_id: GuildId,
    generation: u64,
) -> Option<Option<(Track, u64)>> {
    let mut queues = manager.write().await;
    let queue = queues.get_mut(&guild_id)?;
    queue
        .finish(generation)
        .map(|next| next.map(|t| (t, queue.generation)))
}

pub async fn fail(
    manager: &QueueManager,
    guild_id: GuildId,
    generation: u64,
) -> Option<Option<(Track, u64)>> {
    let mut queues = manager.write().await;
    let queue = queues.get_mut(&guild_id)?;
    queue
        .fail(generation)
        .map(|next| next.map(|t| (t, queue.generation)))
}

pub async fn clear(manager: &QueueManager, guild_id: GuildId) -> Vec<Track> {
    let mut queues = manager.write().await;
    queues
        .get_mut(&guild_id)
        .map(GuildQueue::clear)
        .unwrap_or_default()
}

pub async fn stop(manager: &QueueManager, guild_id: GuildId) {
    let mut queues = manager.write().await;
    if let Some(queue) = queues.get_mut(&guild_id) {
        queue.stop();
    }
}

pub async fn get_queue_list(manager: &QueueManager, guild_id: GuildId) -> (Option<Track>, Vec<Track>) {
    let queues = manager.read().await;
    match queues.get(&guild_id) {
        Some(queue) => (queue.current.clone(), queue.tracks.iter().cloned().collect()),
        None => (None, vec![]),
    }
}

pub async fn shuffle(manager: &QueueManager, guild_id: GuildId) -> usize {
    let mut queues = manager.write().await;
    let queue = queues.entry(guild_id).or_default();
    queue.shuffle(&mut rand::thread_rng())
}

pub async fn remove_at(manager: &QueueManager, guild_id: GuildId, position: usize) -> Option<Track> {
    let mut queues = manager.write().await;
    queues.get_mut(&guild_id).and_then(|q| q.remove_at(position))
}

pub async fn set_loop_mode(manager: &QueueManager, guild_id: GuildId, mode: LoopMode) -> LoopMode {
    let mut queues = manager.write().await;
    let queue = queues.entry(guild_id).or_default();
    queue.loop_mode = mode.clone();
    mode
}

pub async fn set_volume(manager: &QueueManager, guild_id: GuildId, volume: f32) -> f32 {
    let mut queues = manager.write().await;
    queues.entry(guild_id).or_default().set_volume(volume)
}

pub async fn set_announce_channel(manager: &QueueManager, guild_id: GuildId, channel: ChannelId) {
    let mut queues = manager.write().await;
    queues.entry(guild_id).or_default().announce_channel = Some(channel);
}

pub async fn get_current(manager: &QueueManager, guild_id: GuildId) -> Option<Track> {
    let queues = manager.read().await;
    queues.get(&guild_id).and_then(|q| q.current.clone())
}

pub async fn get_volume(manager: &QueueManager, guild_id: GuildId) -> f32 {
    let queues = manager.read().await;
    queues.get(&guild_id).map_or(super::DEFAULT_VOLUME, |q| q.volume)
}

pub async fn get_loop_mode(manager: &QueueManager, guild_id: GuildId) -> LoopMode {
    let queues = manager.read().await;
    queues
        .get(&guild_id)
        .map_or(LoopMode::Off, |q| q.loop_mode.clone())
}

pub async fn is_idle(manager: &QueueManager, guild_id: GuildId) -> bool {
    let queues = manager.read().await;
    queues.get(&guild_id).map_or(true, GuildQueue::is_idle)
}

pub async fn is_empty(manager: &QueueManager, guild_id: GuildId) -> bool {
    let queues = manager.read().await;
    queues.get(&guild_id).map_or(true, GuildQueue::is_empty)
}

#[cfg(test)]
mod tests {
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    use super::*;
    use crate::audio::TrackSource;

    fn track(n: u32) -> Track {
        Track::new(format!("Track {n}"), TrackSource::Stream(format!("https://cdn/{n}.mp3")))
    }

    fn titles(queue: &GuildQueue) -> Vec<String> {
        queue.tracks.iter().map(|t| t.title.clone()).collect()
    }

    #[test]
    fn test_enqueue_keeps_call_order() {
        let mut q = GuildQueue::default();
        for n in 1..=5 {
            assert_eq!(q.enqueue(track(n)), n as usize);
        }
        assert_eq!(
            titles(&q),
            ["Track 1", "Track 2", "Track 3", "Track 4", "Track 5"]
        );
    }

    #[test]
    fn test_enqueue_next_goes_first() {
        let mut q = GuildQueue::default();
        q.enqueue(track(1));
        q.enqueue_next(track(2));
        assert_eq!(titles(&q), ["Track 2", "Track 1"]);
    }

    #[test]
    fn test_skip_starts_next_and_bumps_generation() {
        let mut q = GuildQueue::default();
        q.enqueue(track(1));
        q.enqueue(track(2));
        q.advance(false);
        let before = q.generation;

        let skipped = q.skip(1).unwrap();
        assert_eq!(skipped.skipped.len(), 1);
        let (next, generation) = skipped.next.unwrap();
        assert_eq!(next.title, "Track 2");
        assert_eq!(generation, before + 1);
        assert_eq!(q.current.as_ref().unwrap().title, "Track 2");
    }

    #[test]
    fn test_skip_last_track_goes_idle() {
        let mut q = GuildQueue::default();
        q.enqueue(track(1));
        q.advance(false);

        let skipped = q.skip(1).unwrap();
        assert!(skipped.next.is_none());
        assert!(q.is_idle());
    }

    #[test]
    fn test_skip_when_idle_is_idempotent() {
        let mut q = GuildQueue::default();
        assert!(q.skip(1).is_none());
        let generation = q.generation;
        assert!(q.skip(1).is_none());
        assert!(q.skip(3).is_none());
        assert!(q.is_idle());
        assert_eq!(q.generation, generation);
    }

    #[test]
    fn test_skip_many() {
        let mut q = GuildQueue::default();
        for n in 1..=5 {
            q.enqueue(track(n));
        }
        q.advance(false);

        let skipped = q.skip(3).unwrap();
        assert_eq!(skipped.skipped.len(), 3);
        assert_eq!(skipped.next.unwrap().0.title, "Track 4");
        assert_eq!(titles(&q), ["Track 5"]);

        // More than what is left just empties the session.
        let skipped = q.skip(10).unwrap();
        assert_eq!(skipped.skipped.len(), 2);
        assert!(skipped.next.is_none());
        assert!(q.is_empty());
    }

    #[test]
    fn test_skip_many_keeps_repeat_all_order() {
        let mut q = GuildQueue::default();
        for n in 1..=4 {
            q.enqueue(track(n));
        }
        q.loop_mode = LoopMode::Queue;
        q.advance(false);

        let skipped = q.skip(2).unwrap();
        assert_eq!(skipped.skipped.len(), 2);
        assert_eq!(skipped.next.unwrap().0.title, "Track 3");
        assert_eq!(titles(&q), ["Track 4", "Track 1", "Track 2"]);

        // A full cycle comes back around in the same order.
        assert_eq!(q.advance(false).unwrap().title, "Track 4");
        assert_eq!(q.advance(false).unwrap().title, "Track 1");
        assert_eq!(titles(&q), ["Track 2", "Track 3", "Track 4"]);
    }

    #[test]
    fn test_enqueue_many_next_keeps_playlist_order() {
        let mut q = GuildQueue::default();
        q.enqueue(track(1));
        q.enqueue(track(2));
        assert_eq!(q.enqueue_many_next(vec![track(3), track(4), track(5)]), 3);
        assert_eq!(
            titles(&q),
            ["Track 3", "Track 4", "Track 5", "Track 1", "Track 2"]
        );
    }

    #[test]
    fn test_skip_ignores_song_loop() {
        let mut q = GuildQueue::default();
        q.enqueue(track(1));
        q.enqueue(track(2));
        q.loop_mode = LoopMode::Song;
        q.advance(false);

        assert_eq!(q.advance(false).unwrap().title, "Track 1");
        assert_eq!(q.skip(1).unwrap().next.unwrap().0.title, "Track 2");
    }

    #[test]
    fn test_clear_keeps_current() {
        let mut q = GuildQueue::default();
        for n in 1..=3 {
            q.enqueue(track(n));
        }
        q.advance(false);

        let cleared = q.clear();
        assert_eq!(cleared.len(), 2);
        assert!(q.tracks.is_empty());
        assert_eq!(q.current.as_ref().unwrap().title, "Track 1");
    }

    #[test]
    fn test_finish_ignores_stale_generation() {
        let mut q = GuildQueue::default();
        for n in 1..=3 {
            q.enqueue(track(n));
        }
        q.advance(false);
        let first = q.generation;
        q.skip(1);

        // The skipped track reports its end after the skip already advanced.
        assert!(q.finish(first).is_none());
        assert_eq!(q.current.as_ref().unwrap().title, "Track 2");

        let current = q.generation;
        let next = q.finish(current).unwrap().unwrap();
        assert_eq!(next.title, "Track 3");
    }

    #[test]
    fn test_finish_last_track_goes_idle() {
        let mut q = GuildQueue::default();
        q.enqueue(track(1));
        q.advance(false);
        assert!(q.finish(q.generation).unwrap().is_none());
        assert!(q.is_idle());
    }

    #[test]
    fn test_fail_does_not_repeat_broken_track() {
        let mut q = GuildQueue::default();
        q.enqueue(track(1));
        q.enqueue(track(2));
        q.loop_mode = LoopMode::Song;
        q.advance(false);

        let next = q.fail(q.generation).unwrap().unwrap();
        assert_eq!(next.title, "Track 2");
    }

    #[test]
    fn test_stop_invalidates_running_track() {
        let mut q = GuildQueue::default();
        q.enqueue(track(1));
        q.enqueue(track(2));
        q.advance(false);
        let generation = q.generation;

        q.stop();
        assert!(q.is_empty());
        assert!(q.finish(generation).is_none());
    }

    #[test]
    fn test_shuffle_only_touches_pending() {
        let mut q = GuildQueue::default();
        for n in 1..=10 {
            q.enqueue(track(n));
        }
        q.advance(false);

        let mut rng = StdRng::seed_from_u64(7);
        assert_eq!(q.shuffle(&mut rng), 9);
        assert_eq!(q.current.as_ref().unwrap().title, "Track 1");
        let mut sorted = titles(&q);
        sorted.sort();
        let mut expected: Vec<String> = (2..=10).map(|n| format!("Track {n}")).collect();
        expected.sort();
        assert_eq!(sorted, expected);
    }

    #[test]
    fn test_remove_at_bounds() {
        let mut q = GuildQueue::default();
        q.enqueue(track(1));
        q.enqueue(track(2));
        assert!(q.remove_at(0).is_none());
        assert!(q.remove_at(3).is_none());
        assert_eq!(q.remove_at(2).unwrap().title, "Track 2");
    }

    #[test]
    fn test_volume_is_clamped() {
        let mut q = GuildQueue::default();
        assert!((q.set_volume(1.7) - 1.0).abs() < f32::EPSILON);
        assert!(q.set_volume(-0.2).abs() < f32::EPSILON);
    }

    #[tokio::test]
    async fn test_enqueue_claims_idle_session() {
        let qm = crate::audio::new_queue_manager();
        let gid = GuildId::new(9);

        let first = enqueue(&qm, gid, track(1)).await;
        let (started, generation) = first.start.unwrap();
        assert_eq!(started.title, "Track 1");
        assert_eq!(first.position, 0);

        let second = enqueue(&qm, gid, track(2)).await;
        assert!(second.start.is_none());
        assert_eq!(second.position, 1);

        let next = finish(&qm, gid, generation).await.unwrap().unwrap();
        assert_eq!(next.0.title, "Track 2");
    }
}
