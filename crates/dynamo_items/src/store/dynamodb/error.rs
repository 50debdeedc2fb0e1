//! DynamoDB error mapping.
//!
//! Maps AWS SDK errors to `StoreError`.

use std::fmt::Debug;

use aws_sdk_dynamodb::error::SdkError;
use aws_sdk_dynamodb::operation::get_item::GetItemError;
use aws_sdk_dynamodb::operation::put_item::PutItemError;

use crate::store::StoreError;

/// Map a GetItem SDK error to StoreError.
pub fn map_get_item_error<R: Debug + Send + Sync + 'static>(
    err: SdkError<GetItemError, R>,
    table: &str,
) -> StoreError {
    if let SdkError::DispatchFailure(failure) = &err {
        return StoreError::ConnectionFailed(format!("{:?}", failure));
    }
    match err.into_service_error() {
        GetItemError::ResourceNotFoundException(_) => StoreError::TableNotFound(table.to_string()),
        GetItemError::ProvisionedThroughputExceededException(_) => {
            StoreError::RequestFailed("Throughput exceeded, please retry".to_string())
        }
        GetItemError::RequestLimitExceeded(_) => {
            StoreError::RequestFailed("Request limit exceeded, please retry".to_string())
        }
        GetItemError::InternalServerError(_) => {
            StoreError::RequestFailed("DynamoDB internal server error".to_string())
        }
        err => StoreError::RequestFailed(format!("GetItem failed: {:?}", err)),
    }
}

/// Map a PutItem SDK error to StoreError.
pub fn map_put_item_error<R: Debug + Send + Sync + 'static>(
    err: SdkError<PutItemError, R>,
    table: &str,
) -> StoreError {
    if let SdkError::DispatchFailure(failure) = &err {
        return StoreError::ConnectionFailed(format!("{:?}", failure));
    }
    match err.into_service_error() {
        PutItemError::ResourceNotFoundException(_) => StoreError::TableNotFound(table.to_string()),
        PutItemError::ProvisionedThroughputExceededException(_) => {
            StoreError::RequestFailed("Throughput exceeded, please retry".to_string())
        }
        PutItemError::RequestLimitExceeded(_) => {
            StoreError::RequestFailed("Request limit exceeded, please retry".to_string())
        }
        PutItemError::ItemCollectionSizeLimitExceededException(_) => {
            StoreError::RequestFailed("Item collection size limit exceeded".to_string())
        }
        PutItemError::TransactionConflictException(_) => {
            StoreError::RequestFailed("Transaction conflict, please retry".to_string())
        }
        PutItemError::InternalServerError(_) => {
            StoreError::RequestFailed("DynamoDB internal server error".to_string())
        }
        err => StoreError::RequestFailed(format!("PutItem failed: {:?}", err)),
    }
}
