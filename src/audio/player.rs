use std::sync::Arc;

use async_trait::async_trait;
use serenity::builder::CreateMessage;
use serenity::http::Http;
use serenity::model::id::{ChannelId, GuildId};
use songbird::events::{Event, EventContext, EventHandler, TrackEvent};
use songbird::input::{File, HttpRequest, Input, YoutubeDl};
use songbird::tracks::PlayMode;
use songbird::{Call, Songbird};
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

use super::queue::{self, Enqueued, Skipped};
use super::{QueueManager, Track, TrackSource};
use crate::store::Database;
use crate::utils::{components, embed};
use crate::Error;

/// Drives songbird from the per-guild queues.
#[derive(Clone)]
pub struct Player {
    pub queue_manager: QueueManager,
    http_client: reqwest::Client,
    discord: Arc<Http>,
    db: Arc<Database>,
}

struct TrackEndNotifier {
    player: Player,
    guild_id: GuildId,
    call: Arc<Mutex<Call>>,
    generation: u64,
    failed: bool,
}

#[async_trait]
impl EventHandler for TrackEndNotifier {
    async fn act(&self, ctx: &EventContext<'_>) -> Option<Event> {
        if let EventContext::Track(tracks) = ctx {
            for (state, _) in tracks.iter() {
                if let PlayMode::Errored(e) = &state.playing {
                    warn!("playback error in guild {}: {e}", self.guild_id);
                }
            }
        }

        let player = self.player.clone();
        let guild_id = self.guild_id;
        let call = self.call.clone();
        let generation = self.generation;
        let failed = self.failed;

        tokio::spawn(async move {
            player.track_ended(&call, guild_id, generation, failed).await;
        });

        None
    }
}

fn input_for(http_client: &reqwest::Client, source: &TrackSource) -> Input {
    match source {
        TrackSource::YouTube(url) => YoutubeDl::new(http_client.clone(), url.clone()).into(),
        TrackSource::Search(query) => YoutubeDl::new_search(http_client.clone(), query.clone()).into(),
        TrackSource::Stream(url) => HttpRequest::new(http_client.clone(), url.clone()).into(),
        TrackSource::File(path) => File::new(path.clone()).into(),
    }
}

impl Player {
    pub fn new(
        queue_manager: QueueManager,
        http_client: reqwest::Client,
        discord: Arc<Http>,
        db: Arc<Database>,
    ) -> Self {
        Self {
            queue_manager,
            http_client,
            discord,
            db,
        }
    }

    /// Connects to `channel_id`, moving the bot if it sits elsewhere.
    pub async fn join(
        &self,
        songbird: &Songbird,
        guild_id: GuildId,
        channel_id: ChannelId,
    ) -> Result<Arc<Mutex<Call>>, Error> {
        if let Some(call) = songbird.get(guild_id) {
            if call.lock().await.current_channel() == Some(channel_id.into()) {
                return Ok(call);
            }
        }
        Ok(songbird.join(guild_id, channel_id).await?)
    }

    /// Disconnects and forgets the guild's session.
    pub async fn leave(&self, songbird: &Songbird, guild_id: GuildId) -> Result<(), Error> {
        queue::stop(&self.queue_manager, guild_id).await;
        if songbird.get(guild_id).is_some() {
            songbird.remove(guild_id).await?;
        }
        Ok(())
    }

    pub async fn enqueue(
        &self,
        call: &Arc<Mutex<Call>>,
        guild_id: GuildId,
        track: Track,
        play_next: bool,
    ) -> Enqueued {
        let mut enqueued = if play_next {
            queue::enqueue_next(&self.queue_manager, guild_id, track).await
        } else {
            queue::enqueue(&self.queue_manager, guild_id, track).await
        };
        enqueued.start = self.start_from(call, guild_id, enqueued.start.take()).await;
        enqueued
    }

    pub async fn enqueue_many(
        &self,
        call: &Arc<Mutex<Call>>,
        guild_id: GuildId,
        tracks: Vec<Track>,
        play_next: bool,
    ) -> Enqueued {
        let mut enqueued = if play_next {
            queue::enqueue_many_next(&self.queue_manager, guild_id, tracks).await
        } else {
            queue::enqueue_many(&self.queue_manager, guild_id, tracks).await
        };
        enqueued.start = self.start_from(call, guild_id, enqueued.start.take()).await;
        enqueued
    }

    /// Skips `count` tracks. `None` when nothing was playing.
    pub async fn skip(
        &self,
        call: &Arc<Mutex<Call>>,
        guild_id: GuildId,
        count: usize,
    ) -> Option<Skipped> {
        let mut skipped = queue::skip(&self.queue_manager, guild_id, count).await?;
        skipped.next = self.start_from(call, guild_id, skipped.next.take()).await;
        if skipped.next.is_none() {
            call.lock().await.stop();
        }
        Some(skipped)
    }

    /// Forgets the session and silences the call without leaving it.
    pub async fn stop_session(&self, songbird: &Songbird, guild_id: GuildId) {
        queue::stop(&self.queue_manager, guild_id).await;
        if let Some(call) = songbird.get(guild_id) {
            call.lock().await.stop();
        }
    }

    pub async fn stop(&self, call: &Arc<Mutex<Call>>, guild_id: GuildId) {
        queue::stop(&self.queue_manager, guild_id).await;
        call.lock().await.stop();
    }

    /// Pauses or resumes the current track. Returns false when idle.
    pub async fn set_paused(&self, guild_id: GuildId, paused: bool) -> Result<bool, Error> {
        let handle = {
            let queues = self.queue_manager.read().await;
            queues.get(&guild_id).and_then(|q| q.track_handle.clone())
        };
        let Some(handle) = handle else {
            return Ok(false);
        };
        if paused {
            handle.pause()?;
        } else {
            handle.play()?;
        }
        Ok(true)
    }

    pub async fn is_paused(&self, guild_id: GuildId) -> bool {
        let handle = {
            let queues = self.queue_manager.read().await;
            queues.get(&guild_id).and_then(|q| q.track_handle.clone())
        };
        match handle {
            Some(h) => h
                .get_info()
                .await
                .map(|info| info.playing == PlayMode::Pause)
                .unwrap_or(false),
            None => false,
        }
    }

    /// Starts tracks until one plays, skipping those that fail to start.
    async fn start_from(
        &self,
        call: &Arc<Mutex<Call>>,
        guild_id: GuildId,
        mut next: Option<(Track, u64)>,
    ) -> Option<(Track, u64)> {
        while let Some((track, generation)) = next {
            match self.start(call, guild_id, &track, generation).await {
                Ok(()) => return Some((track, generation)),
                Err(e) => {
                    error!("could not start {}: {e}", track.title);
                    next = queue::fail(&self.queue_manager, guild_id, generation)
                        .await
                        .flatten();
                }
            }
        }
        None
    }

    async fn start(
        &self,
        call: &Arc<Mutex<Call>>,
        guild_id: GuildId,
        track: &Track,
        generation: u64,
    ) -> Result<(), Error> {
        let volume = queue::get_volume(&self.queue_manager, guild_id).await;
        let input = input_for(&self.http_client, &track.source);

        let handle = {
            let mut handler = call.lock().await;
            let handle = handler.play_only(input.into());
            handle.set_volume(volume)?;
            for (event, failed) in [(TrackEvent::End, false), (TrackEvent::Error, true)] {
                handle.add_event(
                    Event::Track(event),
                    TrackEndNotifier {
                        player: self.clone(),
                        guild_id,
                        call: call.clone(),
                        generation,
                        failed,
                    },
                )?;
            }
            handle
        };

        {
            let mut queues = self.queue_manager.write().await;
            if let Some(q) = queues.get_mut(&guild_id) {
                if q.generation == generation {
                    q.track_handle = Some(handle);
                }
            }
        }

        if track.key.is_some() {
            if let Err(e) = self.db.record_play(track) {
                warn!("could not record play of {}: {e}", track.title);
            }
        }

        info!("now playing in guild {guild_id}: {}", track.title);
        Ok(())
    }

    async fn track_ended(
        &self,
        call: &Arc<Mutex<Call>>,
        guild_id: GuildId,
        generation: u64,
        failed: bool,
    ) {
        let next = if failed {
            queue::fail(&self.queue_manager, guild_id, generation).await
        } else {
            queue::finish(&self.queue_manager, guild_id, generation).await
        };

        let Some(next) = next else {
            debug!("ignoring end of superseded track in guild {guild_id}");
            return;
        };

        match self.start_from(call, guild_id, next).await {
            Some((track, _)) => self.announce(guild_id, &track).await,
            None => info!("queue finished in guild {guild_id}"),
        }
    }

    async fn announce(&self, guild_id: GuildId, track: &Track) {
        let (channel, upcoming) = {
            let queues = self.queue_manager.read().await;
            match queues.get(&guild_id) {
                Some(q) => (q.announce_channel, q.tracks.iter().cloned().collect::<Vec<_>>()),
                None => return,
            }
        };
        let Some(channel) = channel else {
            return;
        };

        let message = CreateMessage::new()
            .embed(embed::now_playing(track))
            .components(components::music_components(false, &upcoming));
        if let Err(e) = channel.send_message(&self.discord, message).await {
            warn!("could not announce track in {channel}: {e}");
        }
    }
}
