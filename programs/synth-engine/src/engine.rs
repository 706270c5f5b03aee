use std::{
    collections::BTreeMap,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};

use solana_program::{msg, pubkey::Pubkey};

use crate::{
    error::SynthEngineError,
    events::EngineEvent,
    guard::ReentrancyGuard,
    health::{
        calculate_health_factor, is_healthy, LIQUIDATION_BONUS, LIQUIDATION_PRECISION,
        LIQUIDATION_THRESHOLD, MIN_HEALTH_FACTOR,
    },
    math::{self, PRECISION},
    oracle::{AssetPrice, PriceOracle, QuoteCache},
    stage::{Interaction, LedgerChange, Stage},
    state::{EngineConfig, EngineState},
    token::{Capabilities, CollateralToken, DebtToken},
};

/// Collateral/debt engine for a USD-pegged synthetic token.
///
/// Every state-mutating entry point takes the reentrancy guard, stages its ledger
/// changes, checks invariants against the staged state and only then calls out to
/// the token capabilities. Any failure rolls the whole operation back.
pub struct SynthEngine {
    config: EngineConfig,
    oracle: Arc<dyn PriceOracle>,
    caps: Capabilities,
    state: Mutex<EngineState>,
    guard: ReentrancyGuard,
    events: Mutex<Vec<EngineEvent>>,
}

impl SynthEngine {
    pub fn new(
        config: EngineConfig,
        oracle: Arc<dyn PriceOracle>,
        collateral_tokens: Vec<Arc<dyn CollateralToken>>,
        debt_token: Arc<dyn DebtToken>,
    ) -> Result<Self, SynthEngineError> {
        config.validate()?;

        let found = debt_token.token_id();
        if found != config.debt_token {
            return Err(SynthEngineError::DebtTokenMismatch {
                expected: config.debt_token,
                found,
            });
        }

        let mut collateral = BTreeMap::new();
        for token in collateral_tokens {
            let asset = token.asset_id();
            if !config.is_registered(&asset) {
                return Err(SynthEngineError::AssetNotAllowed(asset));
            }
            collateral.insert(asset, token);
        }
        if let Some(missing) = config
            .collateral_assets
            .iter()
            .find(|asset| !collateral.contains_key(*asset))
        {
            return Err(SynthEngineError::MissingCollateralToken(*missing));
        }

        msg!(
            "Synth engine initialized with {} collateral assets, debt token {}",
            config.collateral_assets.len(),
            config.debt_token
        );

        Ok(Self {
            caps: Capabilities {
                custody: config.custody,
                collateral,
                debt_token,
            },
            config,
            oracle,
            state: Mutex::new(EngineState::default()),
            guard: ReentrancyGuard::new(),
            events: Mutex::new(Vec::new()),
        })
    }

    // ----- state-mutating entry points -----

    pub fn deposit_collateral(
        &self,
        user: &Pubkey,
        asset: &Pubkey,
        amount: u128,
    ) -> Result<(), SynthEngineError> {
        let _entered = self.guard.enter()?;
        let mut op = self.begin();
        let outcome = op.deposit_collateral(*user, *asset, amount);
        op.finish(outcome)
    }

    pub fn mint_debt(&self, user: &Pubkey, amount: u128) -> Result<(), SynthEngineError> {
        let _entered = self.guard.enter()?;
        let mut op = self.begin();
        let outcome = op.mint_debt(*user, amount);
        op.finish(outcome)
    }

    pub fn deposit_collateral_and_mint(
        &self,
        user: &Pubkey,
        asset: &Pubkey,
        collateral_amount: u128,
        mint_amount: u128,
    ) -> Result<(), SynthEngineError> {
        let _entered = self.guard.enter()?;
        let mut op = self.begin();
        let outcome = op
            .deposit_collateral(*user, *asset, collateral_amount)
            .and_then(|_| op.mint_debt(*user, mint_amount));
        op.finish(outcome)
    }

    /// Redeem `amount` of the caller's collateral to `recipient`. Fails if the
    /// caller's health factor would end up broken.
    pub fn redeem_collateral(
        &self,
        user: &Pubkey,
        asset: &Pubkey,
        amount: u128,
        recipient: &Pubkey,
    ) -> Result<(), SynthEngineError> {
        let _entered = self.guard.enter()?;
        let mut op = self.begin();
        let outcome = op
            .redeem_collateral(*asset, amount, *user, *recipient)
            .and_then(|_| op.ensure_healthy(*user));
        op.finish(outcome)
    }

    pub fn burn_debt(&self, user: &Pubkey, amount: u128) -> Result<(), SynthEngineError> {
        let _entered = self.guard.enter()?;
        let mut op = self.begin();
        let outcome = op.burn_debt(amount, *user, *user);
        op.finish(outcome)
    }

    /// Burn debt and redeem collateral back to the caller in one operation.
    pub fn redeem_collateral_for_debt(
        &self,
        user: &Pubkey,
        asset: &Pubkey,
        collateral_amount: u128,
        burn_amount: u128,
    ) -> Result<(), SynthEngineError> {
        let _entered = self.guard.enter()?;
        let mut op = self.begin();
        let outcome = op
            .burn_debt(burn_amount, *user, *user)
            .and_then(|_| op.redeem_collateral(*asset, collateral_amount, *user, *user))
            .and_then(|_| op.ensure_healthy(*user));
        op.finish(outcome)
    }

    /// Cover `debt_to_cover` of `user`'s debt with the liquidator's own debt tokens
    /// and seize the equivalent collateral plus the liquidation bonus.
    ///
    /// Returns the amount of `asset` paid to the liquidator. The user must be
    /// below the minimum health factor and must end strictly healthier than they
    /// started. Once a position's collateral is worth less than its debt no
    /// liquidation can satisfy that, and the position stays as is.
    pub fn liquidate(
        &self,
        liquidator: &Pubkey,
        asset: &Pubkey,
        user: &Pubkey,
        debt_to_cover: u128,
    ) -> Result<u128, SynthEngineError> {
        let _entered = self.guard.enter()?;
        let mut op = self.begin();
        let outcome = op.liquidate(*liquidator, *asset, *user, debt_to_cover);
        op.finish(outcome)
    }

    // ----- read-only surface -----

    pub fn collateral_balance(&self, user: &Pubkey, asset: &Pubkey) -> u128 {
        self.lock_state().collateral_of(user, asset)
    }

    pub fn debt_of(&self, user: &Pubkey) -> u128 {
        self.lock_state().debt_of(user)
    }

    pub fn total_debt(&self) -> u128 {
        self.lock_state().debt.total()
    }

    /// Amount of `asset` held in custody across all users.
    pub fn total_collateral(&self, asset: &Pubkey) -> u128 {
        self.lock_state().total_collateral(asset)
    }

    pub fn state_snapshot(&self) -> EngineState {
        self.lock_state().clone()
    }

    pub fn account_collateral_value(&self, user: &Pubkey) -> Result<u128, SynthEngineError> {
        self.begin().collateral_value(*user)
    }

    /// `(debt, collateral value in USD)` for `user`.
    pub fn account_information(&self, user: &Pubkey) -> Result<(u128, u128), SynthEngineError> {
        let value = self.account_collateral_value(user)?;
        Ok((self.debt_of(user), value))
    }

    pub fn health_factor(&self, user: &Pubkey) -> Result<u128, SynthEngineError> {
        self.begin().health_factor(*user)
    }

    pub fn usd_value(&self, asset: &Pubkey, amount: u128) -> Result<u128, SynthEngineError> {
        self.begin().price(*asset)?.to_usd(amount)
    }

    pub fn token_amount_from_usd(&self, asset: &Pubkey, usd_amount: u128) -> Result<u128, SynthEngineError> {
        self.begin().price(*asset)?.from_usd(usd_amount)
    }

    pub fn calculate_health_factor(&self, total_debt: u128, collateral_value_usd: u128) -> u128 {
        calculate_health_factor(total_debt, collateral_value_usd)
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn collateral_assets(&self) -> &[Pubkey] {
        &self.config.collateral_assets
    }

    pub fn price_feed(&self, asset: &Pubkey) -> Option<Pubkey> {
        self.config.price_feed(asset)
    }

    pub fn debt_token(&self) -> Pubkey {
        self.config.debt_token
    }

    pub fn custody(&self) -> Pubkey {
        self.config.custody
    }

    pub fn precision(&self) -> u128 {
        PRECISION
    }

    pub fn liquidation_threshold(&self) -> u128 {
        LIQUIDATION_THRESHOLD
    }

    pub fn liquidation_precision(&self) -> u128 {
        LIQUIDATION_PRECISION
    }

    pub fn liquidation_bonus(&self) -> u128 {
        LIQUIDATION_BONUS
    }

    pub fn min_health_factor(&self) -> u128 {
        MIN_HEALTH_FACTOR
    }

    /// Events published by committed operations, oldest first.
    ///
    /// The log is retained until drained with [`take_events`](Self::take_events).
    /// Events of an operation in flight stay staged and only appear once it
    /// commits; a rolled-back operation never appears.
    pub fn events(&self) -> Vec<EngineEvent> {
        self.events.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    /// Drain the event log.
    pub fn take_events(&self) -> Vec<EngineEvent> {
        std::mem::take(&mut *self.events.lock().unwrap_or_else(PoisonError::into_inner))
    }

    // ----- internals -----

    fn begin(&self) -> Operation<'_> {
        Operation {
            engine: self,
            stage: Stage::new(),
            quotes: QuoteCache::new(&*self.oracle),
        }
    }

    fn lock_state(&self) -> MutexGuard<'_, EngineState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn publish(&self, events: Vec<EngineEvent>) {
        for event in &events {
            event.log();
        }
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .extend(events);
    }

    fn require_registered(&self, asset: &Pubkey) -> Result<Pubkey, SynthEngineError> {
        self.config
            .price_feed(asset)
            .ok_or(SynthEngineError::AssetNotAllowed(*asset))
    }
}

fn require_nonzero(amount: u128) -> Result<(), SynthEngineError> {
    if amount == 0 {
        return Err(SynthEngineError::ZeroAmount);
    }
    Ok(())
}

/// One logical operation: its staged effects and its price snapshot.
///
/// Helpers here never take the reentrancy guard, so public entry points can
/// compose them freely.
struct Operation<'a> {
    engine: &'a SynthEngine,
    stage: Stage,
    quotes: QuoteCache<'a>,
}

impl<'a> Operation<'a> {
    fn deposit_collateral(&mut self, user: Pubkey, asset: Pubkey, amount: u128) -> Result<(), SynthEngineError> {
        require_nonzero(amount)?;
        self.engine.require_registered(&asset)?;

        self.apply(LedgerChange::CollateralIncreased { user, asset, amount })?;
        self.stage.emit(EngineEvent::CollateralDeposited { user, asset, amount });
        self.stage.settle(Interaction::PullCollateral { asset, owner: user, amount });
        Ok(())
    }

    fn mint_debt(&mut self, user: Pubkey, amount: u128) -> Result<(), SynthEngineError> {
        require_nonzero(amount)?;

        self.apply(LedgerChange::DebtIncreased { user, amount })?;
        self.ensure_healthy(user)?;
        self.stage.emit(EngineEvent::DebtMinted { user, amount });
        self.stage.settle(Interaction::MintDebt { to: user, amount });
        Ok(())
    }

    /// Move collateral out of `from`'s position to `to`. Does not check `from`'s
    /// health; callers decide whether that is required.
    fn redeem_collateral(
        &mut self,
        asset: Pubkey,
        amount: u128,
        from: Pubkey,
        to: Pubkey,
    ) -> Result<(), SynthEngineError> {
        require_nonzero(amount)?;
        self.engine.require_registered(&asset)?;

        self.apply(LedgerChange::CollateralDecreased { user: from, asset, amount })?;
        self.stage.emit(EngineEvent::CollateralRedeemed { from, to, asset, amount });
        self.stage.settle(Interaction::PushCollateral { asset, to, amount });
        Ok(())
    }

    /// Reduce `on_behalf_of`'s debt, paid with debt tokens pulled from `payer`.
    fn burn_debt(&mut self, amount: u128, on_behalf_of: Pubkey, payer: Pubkey) -> Result<(), SynthEngineError> {
        require_nonzero(amount)?;

        self.apply(LedgerChange::DebtDecreased { user: on_behalf_of, amount })?;
        self.stage.emit(EngineEvent::DebtBurned { on_behalf_of, payer, amount });
        self.stage.queue(Interaction::PullDebt { owner: payer, amount });
        self.stage.settle(Interaction::BurnDebt { amount });
        Ok(())
    }

    fn liquidate(
        &mut self,
        liquidator: Pubkey,
        asset: Pubkey,
        user: Pubkey,
        debt_to_cover: u128,
    ) -> Result<u128, SynthEngineError> {
        require_nonzero(debt_to_cover)?;
        self.engine.require_registered(&asset)?;

        let starting = self.health_factor(user)?;
        if is_healthy(starting) {
            return Err(SynthEngineError::HealthFactorOk);
        }

        let price = self.price(asset)?;
        let token_amount = price.from_usd(debt_to_cover)?;
        let bonus = math::mul_div(token_amount, LIQUIDATION_BONUS, LIQUIDATION_PRECISION)?;
        let seized = math::checked_add(token_amount, bonus)?;

        self.redeem_collateral(asset, seized, user, liquidator)?;
        self.burn_debt(debt_to_cover, user, liquidator)?;

        let ending = self.health_factor(user)?;
        if ending <= starting {
            msg!("Health factor not improved: {} -> {}", starting, ending);
            return Err(SynthEngineError::HealthFactorNotImproved);
        }
        self.ensure_healthy(liquidator)?;

        self.stage.emit(EngineEvent::Liquidated {
            liquidator,
            user,
            asset,
            debt_covered: debt_to_cover,
            collateral_seized: seized,
        });
        Ok(seized)
    }

    fn apply(&mut self, change: LedgerChange) -> Result<(), SynthEngineError> {
        let mut state = self.engine.lock_state();
        self.stage.apply(&mut state, change)
    }

    fn price(&mut self, asset: Pubkey) -> Result<AssetPrice, SynthEngineError> {
        let feed = self.engine.require_registered(&asset)?;
        self.quotes.price(asset, &feed)
    }

    fn collateral_value(&mut self, user: Pubkey) -> Result<u128, SynthEngineError> {
        // Copy balances out so no lock is held while the oracle is queried
        let balances: Vec<(Pubkey, u128)> = {
            let state = self.engine.lock_state();
            self.engine
                .config
                .collateral_assets
                .iter()
                .map(|asset| (*asset, state.collateral_of(&user, asset)))
                .collect()
        };

        let mut total = 0u128;
        for (asset, amount) in balances {
            if amount == 0 {
                continue;
            }
            let value = self.price(asset)?.to_usd(amount)?;
            total = math::checked_add(total, value)?;
        }
        Ok(total)
    }

    fn health_factor(&mut self, user: Pubkey) -> Result<u128, SynthEngineError> {
        let debt = self.engine.lock_state().debt_of(&user);
        if debt == 0 {
            return Ok(u128::MAX);
        }
        let value = self.collateral_value(user)?;
        Ok(calculate_health_factor(debt, value))
    }

    fn ensure_healthy(&mut self, user: Pubkey) -> Result<(), SynthEngineError> {
        let health_factor = self.health_factor(user)?;
        if !is_healthy(health_factor) {
            return Err(SynthEngineError::HealthFactorBroken(health_factor));
        }
        Ok(())
    }

    /// Run the queued interactions and commit, or roll everything back.
    fn finish<T>(mut self, outcome: Result<T, SynthEngineError>) -> Result<T, SynthEngineError> {
        let engine = self.engine;
        let outcome = outcome.and_then(|value| self.stage.execute(&engine.caps).map(|_| value));

        match outcome {
            Ok(value) => {
                engine.publish(self.stage.commit());
                Ok(value)
            }
            Err(err) => {
                msg!("Operation rolled back: {}", err);
                let mut state = engine.lock_state();
                self.stage.rollback(&mut state);
                Err(err)
            }
        }
    }
}
