/// Lightweight test harness for custody integration tests
///
/// Runs custodians in-process behind a [`CustodianClient`] that needs no
/// network, and provides wallets that produce real chain signatures.
///
/// # Example
///
/// ```rust,ignore
/// use common::testkit::{TestCluster, TestWallet};
///
/// #[tokio::test]
/// async fn test_recover() -> anyhow::Result<()> {
///     let cluster = TestCluster::new(4);
///     let wallet = TestWallet::generate();
///
///     // distribute through cluster.registry(), then recover through
///     // cluster.client() with a request signed by the wallet
///     let request = wallet.recovery_request("k1", &nonce);
///     assert_eq!(cluster.calls(), 3);
///     Ok(())
/// }
/// ```
///
/// [`CustodianClient`]: crate::custody::CustodianClient
mod cluster;
mod wallet;

pub use cluster::{LocalCustodianClient, TestCluster};
pub use wallet::{TestWallet, TonWallet};
