//! Typed `alloy` contract bindings for the two bridge contracts and the
//! ERC-20 token standard. These interfaces are hand-written directly in
//! the `sol!` macro for types that have no Foundry build artifact to
//! generate from. `#[sol(rpc)]` additionally generates
//! typed call/send methods bound to any `alloy_provider::Provider`, which is
//! exactly the "typed facade" `chain-client` builds on top of.

use alloy_sol_macro::sol;

sol! {
    #[sol(rpc)]
    #[derive(Debug)]
    interface IRequestManager {
        struct RequestData {
            uint256 targetChainId;
            address sourceTokenAddress;
            address targetTokenAddress;
            address targetAddress;
            uint256 amount;
            uint256 validUntil;
            uint256 lpFee;
            uint256 protocolFee;
            address filler;
            bytes32 fillId;
        }

        event RequestCreated(
            bytes32 indexed requestId,
            uint256 targetChainId,
            address sourceTokenAddress,
            address targetTokenAddress,
            address indexed sourceAddress,
            address targetAddress,
            uint256 amount,
            uint256 nonce,
            uint256 validUntil
        );

        event ClaimMade(
            bytes32 indexed requestId,
            uint256 claimId,
            bytes32 fillId,
            address claimer,
            uint256 claimerStake,
            address lastChallenger,
            uint256 challengerStakeTotal,
            uint256 termination
        );

        event ClaimWithdrawn(bytes32 indexed requestId, uint256 claimId, address claimReceiver);

        /// Emitted when a messenger-relayed L1 resolution lands on the
        /// source rollup, naming the authoritative `(filler, fillId)` for a
        /// request.
        event RequestResolved(bytes32 indexed requestId, bytes32 fillId, uint256 chainId, address filler);

        function claimStake() external view returns (uint256);

        function requests(bytes32 requestId) external view returns (RequestData memory);

        function claimRequest(bytes32 requestId, bytes32 fillId) external payable returns (uint256);

        function challengeClaim(uint256 claimId) external payable;

        function withdraw(uint256 claimId) external returns (address);

        function withdrawOnBehalfOf(address onBehalfOf, uint256 claimId) external returns (address);

        function resolveRequest(
            bytes32 requestId,
            bytes32 fillId,
            uint256 chainId,
            address filler
        ) external;
    }
}

sol! {
    #[sol(rpc)]
    #[derive(Debug)]
    interface IFillManager {
        event RequestFilled(
            bytes32 indexed requestId,
            uint256 sourceChainId,
            address targetTokenAddress,
            address filler,
            bytes32 fillId,
            uint256 amount
        );

        function allowedLPs(address lp) external view returns (bool);

        function fillRequest(
            bytes32 requestId,
            uint256 sourceChainId,
            address targetTokenAddress,
            address targetReceiverAddress,
            uint256 amount
        ) external returns (bytes32);

        function invalidateFill(bytes32 requestId, bytes32 fillId, uint256 sourceChainId) external;

        function isInvalidFill(bytes32 requestId, bytes32 fillId) external view returns (bool);

        event FillInvalidated(bytes32 indexed requestId, bytes32 fillId, uint256 sourceChainId);
    }
}

sol! {
    #[sol(rpc)]
    #[derive(Debug)]
    interface IERC20 {
        function approve(address spender, uint256 amount) external returns (bool);
        function balanceOf(address account) external view returns (uint256);
        function decimals() external view returns (uint8);
        function symbol() external view returns (string memory);
    }
}
