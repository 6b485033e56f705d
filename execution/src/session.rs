//! The owned session context.
//!
//! A [`Session`] holds every piece of mutable state: players, the liquidity
//! pool, the house account, the provably-fair generator, analytics and the
//! rolling log. All commands go through it and run to completion before
//! returning. Monetary inputs from a front end arrive as display values and
//! are converted to minor units here.

use commonware_utils::hex;
use fairstake_types::money::{format_amount, to_minor_units};
use fairstake_types::{
    Amount, Analytics, AnalyticsExport, Anomaly, Bank, BetRecord, ConfigError, EngineConfig,
    House, LiquidityDrift, LiquidityProvider, LpId, LpSnapshot, Player, PlayerId,
    PlayerSnapshot, PlayerStats, ProviderStats, Rejection, RevealedSeed, SchemaStatus, Seed,
    SessionSnapshot, SnapshotError, Strategy, StrategyState, WinThreshold,
    ANALYTICS_EXPORT_VERSION, CURRENT_SCHEMA_VERSION,
};
use tracing::{info, warn};

use crate::analytics::record_bet;
use crate::bet_engine::{BetEngine, BetRequest};
use crate::fairness::{Entropy, ProvablyFair};
use crate::liquidity::LiquidityPool;
use crate::logging::{bet_line, pool_line, SessionLog};

fn display_amount(display: f64) -> Result<Amount, Rejection> {
    match to_minor_units(display) {
        Some(amount) if amount > 0 => Ok(amount),
        _ => Err(Rejection::InvalidAmount),
    }
}

/// A settled bet plus the diagnostics it produced.
pub(crate) struct BetOutcome {
    pub record: BetRecord,
    pub anomaly: Option<Anomaly>,
    pub drift: Option<LiquidityDrift>,
}

pub struct Session {
    pub(crate) config: EngineConfig,
    pub(crate) round: u64,
    pub(crate) clock_ms: u64,
    pub(crate) players: Vec<Player>,
    pub(crate) pool: LiquidityPool,
    pub(crate) house: House,
    pub(crate) fairness: ProvablyFair,
    pub(crate) analytics: Analytics,
    pub(crate) log: SessionLog,
    pub(crate) last_drift: Option<LiquidityDrift>,
}

impl Session {
    /// Start an empty session. `entropy` seeds server-seed generation.
    pub fn new(config: EngineConfig, entropy: Entropy) -> Result<Self, ConfigError> {
        config.validate()?;
        info!(
            min_bet = config.min_bet,
            max_bet = config.max_bet,
            house_edge_bps = config.house_edge_bps,
            fee_bps = config.fee_bps,
            max_exposure_bps = config.max_exposure_bps,
            tokenize = config.lp_tokenization,
            "session created"
        );
        Ok(Self {
            round: 0,
            clock_ms: 0,
            players: Vec::new(),
            pool: LiquidityPool::new(config.lp_tokenization, config.lp_min_lock_ms),
            house: House::default(),
            fairness: ProvablyFair::with_entropy(entropy, config.rolls_per_seed),
            analytics: Analytics::default(),
            log: SessionLog::default(),
            last_drift: None,
            config,
        })
    }

    pub(crate) fn player_index(&self, id: PlayerId) -> Result<usize, Rejection> {
        self.players
            .iter()
            .position(|player| player.id == id)
            .ok_or(Rejection::PlayerNotFound(id))
    }

    fn player_mut(&mut self, id: PlayerId) -> Result<&mut Player, Rejection> {
        let index = self.player_index(id)?;
        Ok(&mut self.players[index])
    }

    /// Record a rejection in the session log and hand it back.
    fn reject<T>(
        &mut self,
        subject: impl std::fmt::Display,
        action: &str,
        rejection: Rejection,
    ) -> Result<T, Rejection> {
        self.log
            .push(format!("{subject} {action} REJECT [{}] {rejection}", rejection.code()));
        Err(rejection)
    }

    fn note_drift(&mut self, drift: Option<LiquidityDrift>) {
        self.last_drift = drift;
        if let Some(drift) = drift.filter(|d| d.magnitude() > self.pool.providers().len() as u64) {
            self.log.push(format!(
                "LIQUIDITY DRIFT recorded={} actual={}",
                format_amount(drift.recorded),
                format_amount(drift.actual)
            ));
        }
    }

    /// Seat a player with an opening balance in minor units.
    pub fn add_player(&mut self, balance: Amount, strategy: Strategy, automated: bool) -> PlayerId {
        let id = PlayerId(self.players.iter().map(|p| p.id.0 + 1).max().unwrap_or(0));
        self.players.push(Player::new(id, balance, strategy, automated));
        self.analytics.initial_value = self.analytics.initial_value.saturating_add(balance);
        info!(player = %id, balance, %strategy, automated, "player added");
        id
    }

    /// Admit a liquidity provider with an opening balance in minor units.
    pub fn add_liquidity_provider(
        &mut self,
        balance: Amount,
        owner: Option<PlayerId>,
    ) -> Result<LpId, Rejection> {
        if let Some(owner) = owner {
            self.player_index(owner)?;
        }
        let mut lp = LiquidityProvider::new(self.pool.next_id(), balance);
        lp.owner = owner;
        let id = self.pool.add_provider(lp);
        self.analytics.initial_value = self.analytics.initial_value.saturating_add(balance);
        info!(lp = %id, balance, ?owner, "liquidity provider added");
        Ok(id)
    }

    pub fn set_client_seed(&mut self, seed: &str) -> bool {
        let updated = self.fairness.set_client_seed(seed);
        if updated {
            self.log.push(format!("CLIENT SEED {seed}"));
        }
        updated
    }

    /// Replace the live server seed (tests and replays).
    pub fn set_server_seed(&mut self, seed: Seed) {
        self.fairness.set_server_seed(seed);
        self.log
            .push(format!("SERVER SEED SET commit={}", hex(&self.fairness.commitment())));
    }

    /// Set the threshold used for scheduled bets. Clamped like any bet threshold.
    pub fn set_win_threshold(&mut self, percent: f64) -> Result<WinThreshold, Rejection> {
        let threshold = WinThreshold::from_percent(percent).ok_or(Rejection::InvalidOdds)?;
        self.config.win_threshold = threshold;
        self.log.push(format!("ROLL UNDER {threshold}"));
        Ok(threshold)
    }

    /// Set absolute stop-loss / take-profit balances (display units). `None` clears a bound.
    pub fn set_stop_bounds(
        &mut self,
        player: PlayerId,
        stop_loss: Option<f64>,
        take_profit: Option<f64>,
    ) -> Result<(), Rejection> {
        let stop_loss = stop_loss
            .map(|v| to_minor_units(v).ok_or(Rejection::InvalidAmount))
            .transpose()?;
        let take_profit = take_profit
            .map(|v| to_minor_units(v).ok_or(Rejection::InvalidAmount))
            .transpose()?;
        let player = self.player_mut(player)?;
        player.stop_loss = stop_loss;
        player.take_profit = take_profit;
        Ok(())
    }

    /// Let the scheduler bet for a manual player. Bets only run while a stop bound is set.
    pub fn set_autobet(&mut self, player: PlayerId, enabled: bool) -> Result<(), Rejection> {
        let player = self.player_mut(player)?;
        player.autobet = enabled;
        let id = player.id;
        self.log
            .push(format!("{id} AUTOBET {}", if enabled { "ON" } else { "OFF" }));
        Ok(())
    }

    pub fn set_base_bet(&mut self, player: PlayerId, display: f64) -> Result<(), Rejection> {
        let amount = display_amount(display)?;
        self.player_mut(player)?.base_bet = amount;
        Ok(())
    }

    /// Advance the session clock used for lock windows.
    pub fn advance_clock(&mut self, ms: u64) {
        self.clock_ms = self.clock_ms.saturating_add(ms);
    }

    /// Resolve a bet for `player`. `stake` is in display units, `threshold` in percent.
    ///
    /// The player's `active` flag is not consulted: deactivation only stops
    /// scheduled bets.
    pub fn place_bet(
        &mut self,
        player: PlayerId,
        stake: f64,
        threshold: f64,
    ) -> Result<BetRecord, Rejection> {
        let stake = match display_amount(stake) {
            Ok(stake) => stake,
            Err(rejection) => return self.reject(player, "BET", rejection),
        };
        self.resolve_bet(player, BetRequest::new(stake, threshold))
            .map(|outcome| outcome.record)
    }

    pub(crate) fn resolve_bet(
        &mut self,
        player: PlayerId,
        request: BetRequest,
    ) -> Result<BetOutcome, Rejection> {
        let index = match self.player_index(player) {
            Ok(index) => index,
            Err(rejection) => return self.reject(player, "BET", rejection),
        };
        let mut engine = BetEngine {
            config: &self.config,
            pool: &mut self.pool,
            house: &mut self.house,
            fairness: &mut self.fairness,
        };
        let settlement = match engine.resolve(&mut self.players[index], &request, self.round) {
            Ok(settlement) => settlement,
            Err(rejection) => return self.reject(player, "BET", rejection),
        };
        let record = settlement.record;
        let seat = &self.players[index];
        self.log.push(bet_line(&record, seat.balance));
        if record.pool_delta != 0 {
            self.log
                .push(pool_line(record.pool_delta, self.pool.liquidity()));
        }
        let anomaly = record_bet(
            &mut self.analytics,
            &record,
            seat.streak,
            self.config.win_threshold,
        );
        if let Some(anomaly) = &anomaly {
            self.log.push(format!(
                "ANOMALY {} streak {} p={:.2e}",
                anomaly.player, anomaly.streak, anomaly.probability
            ));
        }
        self.note_drift(settlement.drift);
        Ok(BetOutcome {
            record,
            anomaly,
            drift: settlement.drift,
        })
    }

    /// Move an LP's available cash (display units) back into the pool.
    pub fn deposit_liquidity(&mut self, lp: LpId, amount: f64) -> Result<Amount, Rejection> {
        let result = display_amount(amount)
            .and_then(|amount| self.pool.deposit(lp, amount, self.clock_ms));
        match result {
            Ok(amount) => {
                self.log.push(format!("{lp} DEPOSIT {}", format_amount(amount)));
                Ok(amount)
            }
            Err(rejection) => self.reject(lp, "DEPOSIT", rejection),
        }
    }

    /// Pull funds (display units) from an LP position into its available cash.
    pub fn withdraw_liquidity(&mut self, lp: LpId, amount: f64) -> Result<Amount, Rejection> {
        let result = display_amount(amount)
            .and_then(|amount| self.pool.withdraw(lp, amount, self.clock_ms));
        match result {
            Ok(amount) => {
                self.log
                    .push(format!("{lp} WITHDRAW {}", format_amount(amount)));
                Ok(amount)
            }
            Err(rejection) => self.reject(lp, "WITHDRAW", rejection),
        }
    }

    /// Move an owned LP's available cash into the owner's wallet.
    pub fn claim_available_cash(&mut self, player: PlayerId, lp: LpId) -> Result<Amount, Rejection> {
        let result = self
            .player_index(player)
            .and_then(|index| self.pool.claim(lp, &mut self.players[index]));
        match result {
            Ok(amount) => {
                self.log
                    .push(format!("{lp} CLAIM -> {player} {}", format_amount(amount)));
                Ok(amount)
            }
            Err(rejection) => self.reject(lp, "CLAIM", rejection),
        }
    }

    /// Move funds (display units) from a player's wallet into their own LP position.
    pub fn stake_into_pool(
        &mut self,
        player: PlayerId,
        lp: LpId,
        amount: f64,
    ) -> Result<Amount, Rejection> {
        let result = self.player_index(player).and_then(|index| {
            let amount = display_amount(amount)?;
            self.pool
                .stake(&mut self.players[index], lp, amount, self.clock_ms)
        });
        match result {
            Ok(amount) => {
                self.log
                    .push(format!("{player} STAKE -> {lp} {}", format_amount(amount)));
                Ok(amount)
            }
            Err(rejection) => self.reject(player, "STAKE", rejection),
        }
    }

    /// Return funds (display units) from an owned LP position to the player's wallet.
    pub fn unstake_from_pool(
        &mut self,
        player: PlayerId,
        lp: LpId,
        amount: f64,
    ) -> Result<Amount, Rejection> {
        let result = self.player_index(player).and_then(|index| {
            let amount = display_amount(amount)?;
            self.pool
                .unstake(&mut self.players[index], lp, amount, self.clock_ms)
        });
        match result {
            Ok(amount) => {
                self.log
                    .push(format!("{player} UNSTAKE <- {lp} {}", format_amount(amount)));
                Ok(amount)
            }
            Err(rejection) => self.reject(player, "UNSTAKE", rejection),
        }
    }

    /// Reveal the live server seed and rotate to a fresh one.
    pub fn reveal_current_seed(&mut self) -> RevealedSeed {
        let revealed = self.fairness.reveal();
        self.log.push(format!(
            "SEED REVEAL seed={} commit={} rolls={}",
            hex(&revealed.server_seed),
            hex(&revealed.commitment),
            revealed.rolls
        ));
        revealed
    }

    pub fn export_snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            schema_version: CURRENT_SCHEMA_VERSION,
            round: self.round,
            clock_ms: self.clock_ms,
            win_threshold: self.config.win_threshold,
            client_seed: Some(self.fairness.client_seed().to_string()),
            players: self
                .players
                .iter()
                .map(|p| PlayerSnapshot {
                    id: p.id,
                    name: p.name.clone(),
                    balance: p.balance,
                    strategy: p.strategy,
                    base_bet: p.base_bet,
                    stop_loss: p.stop_loss,
                    take_profit: p.take_profit,
                    automated: Some(p.automated),
                    autobet: p.autobet,
                    active: p.active,
                    disable_reason: p.disable_reason,
                    total_wagered: p.total_wagered,
                    total_won: p.total_won,
                    total_lost: p.total_lost,
                    initial_balance: Some(p.initial_balance),
                })
                .collect(),
            lps: self
                .pool
                .providers()
                .iter()
                .map(|lp| LpSnapshot {
                    id: lp.id,
                    balance: lp.balance,
                    available_cash: lp.available_cash,
                    owner: lp.owner,
                    initial_stake: lp.initial_stake,
                    total_contributed: lp.total_contributed,
                    total_withdrawn: lp.total_withdrawn,
                    lock_until_ms: lp.lock_until_ms,
                    tokens: Some(lp.tokens),
                })
                .collect(),
            house_fee_balance: self.house.fee_balance,
            bank_liquidity: self.pool.liquidity(),
            total_token_supply: self.pool.bank().total_token_supply,
            initial_value: self.analytics.initial_value,
        }
    }

    /// Replace session state with a snapshot, migrating older schemas.
    ///
    /// The server seed is not part of a snapshot; the live seed keeps running.
    /// Analytics restart from the snapshot's initial value.
    pub fn import_snapshot(&mut self, mut snapshot: SessionSnapshot) -> Result<(), SnapshotError> {
        match snapshot.upgrade(self.config.lp_tokenization) {
            SchemaStatus::Current => {}
            SchemaStatus::Migrated { from } => {
                info!(from, to = CURRENT_SCHEMA_VERSION, "snapshot migrated");
            }
            SchemaStatus::Newer { version } => {
                warn!(
                    version,
                    supported = CURRENT_SCHEMA_VERSION,
                    "snapshot from newer schema loaded partially"
                );
            }
        }
        snapshot.validate()?;

        let players = snapshot
            .players
            .into_iter()
            .map(|p| {
                let name = if p.name.is_empty() {
                    p.strategy.name().to_string()
                } else {
                    p.name
                };
                Player {
                    id: p.id,
                    name,
                    balance: p.balance,
                    strategy: p.strategy,
                    strategy_state: StrategyState::default(),
                    base_bet: p.base_bet,
                    streak: 0,
                    stop_loss: p.stop_loss,
                    take_profit: p.take_profit,
                    total_wagered: p.total_wagered,
                    total_won: p.total_won,
                    total_lost: p.total_lost,
                    initial_balance: p.initial_balance.unwrap_or(p.balance),
                    active: p.active,
                    disable_reason: if p.active { None } else { p.disable_reason },
                    automated: p.automated.unwrap_or(p.id != PlayerId(0)),
                    autobet: p.autobet,
                    last_bet: None,
                    last_rebuy_round: None,
                }
            })
            .collect();

        let mut providers: Vec<LiquidityProvider> = snapshot
            .lps
            .into_iter()
            .map(|lp| LiquidityProvider {
                id: lp.id,
                balance: lp.balance,
                available_cash: lp.available_cash,
                initial_stake: lp.initial_stake,
                total_contributed: lp.total_contributed,
                total_withdrawn: lp.total_withdrawn,
                share_ppm: 0,
                owner: lp.owner,
                lock_until_ms: lp.lock_until_ms,
                tokens: lp.tokens.unwrap_or(0),
            })
            .collect();
        let mut supply = snapshot.total_token_supply;
        if self.config.lp_tokenization && supply == 0 {
            // Saved without tokens: mint one per minor unit so shares stay balance-weighted.
            for lp in &mut providers {
                lp.tokens = lp.balance;
            }
            supply = providers.iter().map(|lp| lp.tokens).sum();
        }
        let bank = Bank {
            liquidity: snapshot.bank_liquidity,
            total_token_supply: supply,
            ..Bank::default()
        };
        let (pool, drift) = LiquidityPool::restore(
            providers,
            bank,
            self.config.lp_tokenization,
            self.config.lp_min_lock_ms,
        );

        self.players = players;
        self.pool = pool;
        self.house = House {
            fee_balance: snapshot.house_fee_balance,
        };
        self.round = snapshot.round;
        self.clock_ms = snapshot.clock_ms;
        self.config.win_threshold = snapshot.win_threshold;
        if let Some(seed) = snapshot.client_seed.as_deref() {
            self.fairness.set_client_seed(seed);
        }
        self.analytics = Analytics {
            initial_value: snapshot.initial_value,
            ..Analytics::default()
        };
        self.log.push(format!(
            "SNAPSHOT LOADED round={} players={} lps={}",
            self.round,
            self.players.len(),
            self.pool.providers().len()
        ));
        self.note_drift(drift);
        info!(round = self.round, players = self.players.len(), "snapshot imported");
        Ok(())
    }

    /// Statistics report: aggregates plus per-player and per-provider standing.
    pub fn export_analytics(&self) -> AnalyticsExport {
        AnalyticsExport {
            version: ANALYTICS_EXPORT_VERSION,
            round: self.round,
            realized_edge: self.analytics.realized_edge(),
            volatility: self.pool.bank().volatility(),
            bank_liquidity: self.pool.liquidity(),
            house_fee_balance: self.house.fee_balance,
            analytics: self.analytics.clone(),
            players: self
                .players
                .iter()
                .map(|p| PlayerStats {
                    id: p.id,
                    name: p.name.clone(),
                    strategy: p.strategy,
                    balance: p.balance,
                    pnl: p.pnl(),
                    streak: p.streak,
                    total_wagered: p.total_wagered,
                    active: p.active,
                })
                .collect(),
            providers: self
                .pool
                .providers()
                .iter()
                .map(|lp| ProviderStats {
                    id: lp.id,
                    owner: lp.owner,
                    balance: lp.balance,
                    available_cash: lp.available_cash,
                    share_ppm: lp.share_ppm,
                    tokens: lp.tokens,
                })
                .collect(),
        }
    }

    pub fn export_json(&self) -> Result<String, SnapshotError> {
        self.export_snapshot().to_json()
    }

    pub fn import_json(&mut self, json: &str) -> Result<(), SnapshotError> {
        self.import_snapshot(SessionSnapshot::from_json(json)?)
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn round(&self) -> u64 {
        self.round
    }

    pub fn clock_ms(&self) -> u64 {
        self.clock_ms
    }

    pub fn players(&self) -> &[Player] {
        &self.players
    }

    pub fn player(&self, id: PlayerId) -> Option<&Player> {
        self.players.iter().find(|player| player.id == id)
    }

    pub fn pool(&self) -> &LiquidityPool {
        &self.pool
    }

    pub fn house(&self) -> &House {
        &self.house
    }

    pub fn analytics(&self) -> &Analytics {
        &self.analytics
    }

    /// Commitment of the live server seed.
    pub fn commitment(&self) -> Seed {
        self.fairness.commitment()
    }

    pub fn client_seed(&self) -> &str {
        self.fairness.client_seed()
    }

    /// Revealed seeds, newest first.
    pub fn revealed_seeds(&self) -> impl Iterator<Item = &RevealedSeed> {
        self.fairness.revealed()
    }

    pub fn log(&self) -> &SessionLog {
        &self.log
    }

    /// Drift snapped by the most recent bet or snapshot import, if any.
    pub fn last_drift(&self) -> Option<LiquidityDrift> {
        self.last_drift
    }

    /// Every unit of money the session tracks: wallets, pool balances,
    /// unclaimed LP cash and house fees.
    pub fn total_value(&self) -> Amount {
        let wallets: Amount = self.players.iter().map(|p| p.balance).sum();
        wallets
            .saturating_add(self.pool.total_balance())
            .saturating_add(self.pool.total_available_cash())
            .saturating_add(self.house.fee_balance)
    }
}
