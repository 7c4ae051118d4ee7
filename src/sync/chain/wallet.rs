//! Wallets sign on-chain writes. They stay locked except inside a [`WalletGuard`].

use std::sync::atomic::{AtomicUsize, Ordering};

use sha2::{Digest, Sha256};

use crate::error::{Result, SyncError};

pub trait Wallet: Send + Sync {
    /// On-chain address of the account behind the wallet.
    fn address(&self) -> &str;

    /// Open a signing session. Sessions nest: the wallet stays unlocked until every
    /// session opened with `unlock` has been closed with `lock`.
    fn unlock(&self, password: &str) -> Result<()>;

    /// Close one signing session.
    fn lock(&self);

    fn is_unlocked(&self) -> bool;

    /// Sign a transaction payload. Fails while locked.
    fn sign(&self, payload: &[u8]) -> Result<String>;
}

/// An open signing session. The session closes when the guard drops; the wallet locks
/// once no session is left.
pub struct WalletGuard<'a> {
    wallet: &'a dyn Wallet,
}

impl<'a> WalletGuard<'a> {
    pub fn acquire(wallet: &'a dyn Wallet, password: &str) -> Result<Self> {
        wallet.unlock(password)?;
        log::trace!("[CHAIN] wallet {} unlocked", wallet.address());
        Ok(Self { wallet })
    }

    pub fn address(&self) -> &str {
        self.wallet.address()
    }

    pub fn sign(&self, payload: &[u8]) -> Result<String> {
        self.wallet.sign(payload)
    }
}

impl Drop for WalletGuard<'_> {
    fn drop(&mut self) {
        self.wallet.lock();
        log::trace!("[CHAIN] wallet {} session closed", self.wallet.address());
    }
}

/// Password-protected wallet signing with a local secret.
pub struct LocalWallet {
    address: String,
    password_digest: [u8; 32],
    secret: Vec<u8>,
    /// Open signing sessions, one per live [`WalletGuard`].
    sessions: AtomicUsize,
}

fn digest(data: &[u8]) -> [u8; 32] {
    Sha256::digest(data).into()
}

impl LocalWallet {
    pub fn new(address: impl Into<String>, password: &str, secret: impl Into<Vec<u8>>) -> Self {
        Self {
            address: address.into(),
            password_digest: digest(password.as_bytes()),
            secret: secret.into(),
            sessions: AtomicUsize::new(0),
        }
    }
}

impl Wallet for LocalWallet {
    fn address(&self) -> &str {
        &self.address
    }

    fn unlock(&self, password: &str) -> Result<()> {
        if digest(password.as_bytes()) != self.password_digest {
            return Err(SyncError::Wallet("wrong wallet password".to_string()));
        }
        self.sessions.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn lock(&self) {
        // An unbalanced lock leaves the count at zero instead of wrapping.
        let _ = self
            .sessions
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1));
    }

    fn is_unlocked(&self) -> bool {
        self.sessions.load(Ordering::SeqCst) > 0
    }

    fn sign(&self, payload: &[u8]) -> Result<String> {
        if !self.is_unlocked() {
            return Err(SyncError::Wallet("wallet is locked".to_string()));
        }
        let mut hasher = Sha256::new();
        hasher.update(&self.secret);
        hasher.update(payload);
        Ok(hex::encode(hasher.finalize()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn wallet() -> LocalWallet {
        LocalWallet::new("0x00000000000000000000000000000000000000aa", "pw", b"secret".to_vec())
    }

    #[test]
    fn guard_unlocks_and_relocks() {
        let w = wallet();
        {
            let guard = WalletGuard::acquire(&w, "pw").unwrap();
            assert!(w.is_unlocked());
            assert_eq!(guard.sign(b"tx").unwrap().len(), 64);
        }
        assert!(!w.is_unlocked());
        assert!(w.sign(b"tx").is_err());
    }

    #[test]
    fn guard_relocks_on_error_path() {
        let w = wallet();
        let run = || -> Result<()> {
            let _guard = WalletGuard::acquire(&w, "pw")?;
            Err(SyncError::Chain("reverted".into()))
        };
        assert!(run().is_err());
        assert!(!w.is_unlocked());
    }

    #[test]
    fn overlapping_guards_keep_wallet_unlocked() {
        let w = wallet();
        let first = WalletGuard::acquire(&w, "pw").unwrap();
        let second = WalletGuard::acquire(&w, "pw").unwrap();

        drop(first);
        assert!(w.is_unlocked());
        assert!(second.sign(b"tx").is_ok());

        drop(second);
        assert!(!w.is_unlocked());
        w.lock();
        assert!(!w.is_unlocked());
    }

    #[test]
    fn wrong_password_is_rejected() {
        let w = wallet();
        assert!(matches!(
            WalletGuard::acquire(&w, "nope"),
            Err(SyncError::Wallet(_))
        ));
        assert!(!w.is_unlocked());
    }
}
