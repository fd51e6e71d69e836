//! Minimal contract bindings.
//!
//! Only the ERC-20 surface the toolkit needs and the OP-stack gas price
//! oracle used for L1 data fees are declared here.

use alloy::sol;

sol! {
	/// Standard ERC-20 token interface.
	interface IERC20 {
		function decimals() external view returns (uint8);
		function symbol() external view returns (string);
		function balanceOf(address account) external view returns (uint256);
		function allowance(address owner, address spender) external view returns (uint256);
		function transfer(address to, uint256 value) external returns (bool);
		function approve(address spender, uint256 value) external returns (bool);

		event Approval(address indexed owner, address indexed spender, uint256 value);
	}

	/// OP-stack GasPriceOracle predeploy.
	interface IGasPriceOracle {
		function getL1Fee(bytes _data) external view returns (uint256);
	}
}
