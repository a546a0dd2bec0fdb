mod helpers;
mod mocks;
mod nets;
mod order_status;
mod refunds;
