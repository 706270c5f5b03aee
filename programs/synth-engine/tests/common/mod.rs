#![allow(dead_code)]

use std::{
    collections::{HashMap, HashSet},
    sync::{
        atomic::{AtomicBool, AtomicUsize, Ordering},
        Arc, Mutex,
    },
};

use solana_program::pubkey::Pubkey;
use synth_engine::{
    math::PRECISION,
    oracle::{OracleQuote, PriceOracle},
    state::EngineConfig,
    token::{CollateralToken, DebtToken},
    CapabilityError, SynthEngine,
};

pub const FEED_DECIMALS: u8 = 8;
pub const ETH_USD_PRICE: i128 = 2_000;
pub const BTC_USD_PRICE: i128 = 1_000;

pub fn wad(units: u128) -> u128 {
    units * PRECISION
}

/// Price feed mock answering with 8-decimal prices.
#[derive(Default)]
pub struct MockOracle {
    quotes: Mutex<HashMap<Pubkey, OracleQuote>>,
    down: Mutex<HashSet<Pubkey>>,
    calls: AtomicUsize,
}

impl MockOracle {
    pub fn set_price(&self, feed: &Pubkey, usd: i128) {
        self.set_raw_price(feed, usd * 100_000_000);
    }

    pub fn set_raw_price(&self, feed: &Pubkey, price: i128) {
        self.quotes.lock().unwrap().insert(
            *feed,
            OracleQuote {
                price,
                decimals: FEED_DECIMALS,
                as_of: 1_700_000_000,
            },
        );
    }

    pub fn set_down(&self, feed: &Pubkey, down: bool) {
        let mut set = self.down.lock().unwrap();
        if down {
            set.insert(*feed);
        } else {
            set.remove(feed);
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl PriceOracle for MockOracle {
    fn quote(&self, feed: &Pubkey) -> Result<OracleQuote, CapabilityError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.down.lock().unwrap().contains(feed) {
            return Err(CapabilityError::StalePrice { as_of: 0 });
        }
        self.quotes
            .lock()
            .unwrap()
            .get(feed)
            .copied()
            .ok_or(CapabilityError::UnknownFeed(*feed))
    }
}

/// ERC20-style balances and allowances.
#[derive(Default)]
pub struct TokenBook {
    balances: HashMap<Pubkey, u128>,
    allowances: HashMap<(Pubkey, Pubkey), u128>,
    supply: u128,
}

impl TokenBook {
    fn mint(&mut self, to: &Pubkey, amount: u128) {
        *self.balances.entry(*to).or_default() += amount;
        self.supply += amount;
    }

    fn burn(&mut self, from: &Pubkey, amount: u128) -> Result<(), CapabilityError> {
        let balance = self.balances.entry(*from).or_default();
        if *balance < amount {
            return Err(CapabilityError::InsufficientBalance);
        }
        *balance -= amount;
        self.supply -= amount;
        Ok(())
    }

    fn transfer(&mut self, from: &Pubkey, to: &Pubkey, amount: u128) -> Result<(), CapabilityError> {
        let balance = self.balances.entry(*from).or_default();
        if *balance < amount {
            return Err(CapabilityError::InsufficientBalance);
        }
        *balance -= amount;
        *self.balances.entry(*to).or_default() += amount;
        Ok(())
    }

    fn transfer_from(
        &mut self,
        owner: &Pubkey,
        spender: &Pubkey,
        amount: u128,
    ) -> Result<(), CapabilityError> {
        let allowance = self.allowances.get(&(*owner, *spender)).copied().unwrap_or(0);
        if allowance < amount {
            return Err(CapabilityError::InsufficientAllowance);
        }
        self.transfer(owner, spender, amount)?;
        self.allowances.insert((*owner, *spender), allowance - amount);
        Ok(())
    }
}

pub type Hook = Box<dyn FnOnce() + Send>;

/// Collateral asset mock with failure switches and a one-shot hook fired on pull.
pub struct MockCollateral {
    id: Pubkey,
    book: Mutex<TokenBook>,
    fail_pull: AtomicBool,
    fail_push: AtomicBool,
    on_pull: Mutex<Option<Hook>>,
}

impl MockCollateral {
    pub fn new() -> Self {
        Self {
            id: Pubkey::new_unique(),
            book: Mutex::new(TokenBook::default()),
            fail_pull: AtomicBool::new(false),
            fail_push: AtomicBool::new(false),
            on_pull: Mutex::new(None),
        }
    }

    pub fn id(&self) -> Pubkey {
        self.id
    }

    pub fn mint(&self, to: &Pubkey, amount: u128) {
        self.book.lock().unwrap().mint(to, amount);
    }

    pub fn approve(&self, owner: &Pubkey, spender: &Pubkey, amount: u128) {
        self.book
            .lock()
            .unwrap()
            .allowances
            .insert((*owner, *spender), amount);
    }

    pub fn balance_of(&self, who: &Pubkey) -> u128 {
        self.book.lock().unwrap().balances.get(who).copied().unwrap_or(0)
    }

    pub fn set_fail_pull(&self, fail: bool) {
        self.fail_pull.store(fail, Ordering::SeqCst);
    }

    pub fn set_fail_push(&self, fail: bool) {
        self.fail_push.store(fail, Ordering::SeqCst);
    }

    pub fn set_on_pull(&self, hook: Hook) {
        *self.on_pull.lock().unwrap() = Some(hook);
    }
}

impl CollateralToken for MockCollateral {
    fn asset_id(&self) -> Pubkey {
        self.id
    }

    fn pull(&self, owner: &Pubkey, custody: &Pubkey, amount: u128) -> Result<(), CapabilityError> {
        let hook = self.on_pull.lock().unwrap().take();
        if let Some(hook) = hook {
            hook();
        }
        if self.fail_pull.load(Ordering::SeqCst) {
            return Err(CapabilityError::Rejected("pull disabled".into()));
        }
        self.book.lock().unwrap().transfer_from(owner, custody, amount)
    }

    fn push(&self, custody: &Pubkey, to: &Pubkey, amount: u128) -> Result<(), CapabilityError> {
        if self.fail_push.load(Ordering::SeqCst) {
            return Err(CapabilityError::Rejected("push disabled".into()));
        }
        self.book.lock().unwrap().transfer(custody, to, amount)
    }
}

/// Synthetic debt token mock. Only the engine is expected to call `mint_to`.
pub struct MockDebtToken {
    id: Pubkey,
    book: Mutex<TokenBook>,
    fail_mint: AtomicBool,
    fail_burn: AtomicBool,
}

impl MockDebtToken {
    pub fn new() -> Self {
        Self {
            id: Pubkey::new_unique(),
            book: Mutex::new(TokenBook::default()),
            fail_mint: AtomicBool::new(false),
            fail_burn: AtomicBool::new(false),
        }
    }

    pub fn id(&self) -> Pubkey {
        self.id
    }

    pub fn approve(&self, owner: &Pubkey, spender: &Pubkey, amount: u128) {
        self.book
            .lock()
            .unwrap()
            .allowances
            .insert((*owner, *spender), amount);
    }

    pub fn transfer(&self, from: &Pubkey, to: &Pubkey, amount: u128) {
        self.book.lock().unwrap().transfer(from, to, amount).unwrap();
    }

    pub fn balance_of(&self, who: &Pubkey) -> u128 {
        self.book.lock().unwrap().balances.get(who).copied().unwrap_or(0)
    }

    pub fn total_supply(&self) -> u128 {
        self.book.lock().unwrap().supply
    }

    pub fn set_fail_mint(&self, fail: bool) {
        self.fail_mint.store(fail, Ordering::SeqCst);
    }

    pub fn set_fail_burn(&self, fail: bool) {
        self.fail_burn.store(fail, Ordering::SeqCst);
    }
}

impl DebtToken for MockDebtToken {
    fn token_id(&self) -> Pubkey {
        self.id
    }

    fn mint_to(&self, to: &Pubkey, amount: u128) -> Result<(), CapabilityError> {
        if self.fail_mint.load(Ordering::SeqCst) {
            return Err(CapabilityError::Rejected("mint disabled".into()));
        }
        self.book.lock().unwrap().mint(to, amount);
        Ok(())
    }

    fn burn(&self, custody: &Pubkey, amount: u128) -> Result<(), CapabilityError> {
        if self.fail_burn.load(Ordering::SeqCst) {
            return Err(CapabilityError::Rejected("burn disabled".into()));
        }
        self.book.lock().unwrap().burn(custody, amount)
    }

    fn pull(&self, owner: &Pubkey, custody: &Pubkey, amount: u128) -> Result<(), CapabilityError> {
        self.book.lock().unwrap().transfer_from(owner, custody, amount)
    }

    fn push(&self, custody: &Pubkey, to: &Pubkey, amount: u128) -> Result<(), CapabilityError> {
        self.book.lock().unwrap().transfer(custody, to, amount)
    }
}

/// Engine wired to a WETH and a WBTC mock at $2000 and $1000.
pub struct Harness {
    pub engine: Arc<SynthEngine>,
    pub oracle: Arc<MockOracle>,
    pub weth: Arc<MockCollateral>,
    pub wbtc: Arc<MockCollateral>,
    pub dsc: Arc<MockDebtToken>,
    pub custody: Pubkey,
    pub weth_feed: Pubkey,
    pub wbtc_feed: Pubkey,
}

impl Harness {
    pub fn new() -> Self {
        let oracle = Arc::new(MockOracle::default());
        let weth = Arc::new(MockCollateral::new());
        let wbtc = Arc::new(MockCollateral::new());
        let dsc = Arc::new(MockDebtToken::new());
        let custody = Pubkey::new_unique();
        let weth_feed = Pubkey::new_unique();
        let wbtc_feed = Pubkey::new_unique();

        oracle.set_price(&weth_feed, ETH_USD_PRICE);
        oracle.set_price(&wbtc_feed, BTC_USD_PRICE);

        let config = EngineConfig::new(
            custody,
            dsc.id(),
            vec![weth.id(), wbtc.id()],
            vec![weth_feed, wbtc_feed],
        )
        .unwrap();

        let collateral: Vec<Arc<dyn CollateralToken>> = vec![weth.clone(), wbtc.clone()];
        let engine = SynthEngine::new(config, oracle.clone(), collateral, dsc.clone()).unwrap();

        Self {
            engine: Arc::new(engine),
            oracle,
            weth,
            wbtc,
            dsc,
            custody,
            weth_feed,
            wbtc_feed,
        }
    }

    /// Mint `amount` of `token` to `user` and approve custody for it.
    pub fn fund(&self, user: &Pubkey, token: &MockCollateral, amount: u128) {
        token.mint(user, amount);
        token.approve(user, &self.custody, amount);
    }

    /// Fund, deposit `weth_amount` of WETH and mint `debt`.
    pub fn open_weth_position(&self, user: &Pubkey, weth_amount: u128, debt: u128) {
        self.fund(user, &self.weth, weth_amount);
        self.engine
            .deposit_collateral_and_mint(user, &self.weth.id(), weth_amount, debt)
            .unwrap();
    }

    pub fn approve_debt(&self, owner: &Pubkey, amount: u128) {
        self.dsc.approve(owner, &self.custody, amount);
    }
}
