//! Contract interfaces and call encoding.
//!
//! The pool interface is the subset shared by Aave V2 and V3: both versions
//! return the health factor as the last word of `getUserAccountData`, which
//! is all the monitor reads.

use alloy::primitives::{address, b256, Address, Bytes, B256};
use alloy::sol;
use alloy::sol_types::SolCall;

sol! {
    /// Lending pool interface (shared by Aave V2 and V3).
    #[sol(rpc)]
    interface IPool {
        function getUserAccountData(address user) external view returns (
            uint256 totalCollateralBase,
            uint256 totalDebtBase,
            uint256 availableBorrowsBase,
            uint256 currentLiquidationThreshold,
            uint256 ltv,
            uint256 healthFactor
        );
    }

    /// ERC-20 metadata subset used to render liquidation amounts.
    #[sol(rpc)]
    interface IERC20Metadata {
        function symbol() external view returns (string);
        function decimals() external view returns (uint8);
    }

    /// Multicall3 aggregator. `aggregate` reverts as a whole if any
    /// sub-call reverts, so a response always carries one result per call.
    #[sol(rpc)]
    interface IMulticall3 {
        struct Call {
            address target;
            bytes callData;
        }

        function aggregate(Call[] calldata calls) external payable returns (
            uint256 blockNumber,
            bytes[] memory returnData
        );
    }
}

/// Multicall3 is deployed at the same address on every supported chain.
pub const MULTICALL3_ADDRESS: Address = address!("cA11bde05977b3631167028862bE2a173976CA11");

/// keccak256("LiquidationCall(address,address,address,uint256,uint256,address,bool)")
///
/// Emitted with the same signature by Aave V2 and V3 pools.
pub const LIQUIDATION_CALL_TOPIC: B256 =
    b256!("e413a321e8681d831f4dbccbca790d2952b56f977908e45be37335533e005286");

/// ABI-encode a `getUserAccountData(user)` call for use in an aggregated read.
pub fn user_account_data_call(user: Address) -> Bytes {
    IPool::getUserAccountDataCall { user }.abi_encode().into()
}
