/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at http://mozilla.org/MPL/2.0/. */

//! HTTP-level client tests against a mock server.

use ews_sync::operations::DeleteType;
use ews_sync::{
    BaseFolderId, BaseShape, EwsClient, HttpTransport, ItemId, ItemShape,
};
use url::Url;
use wiremock::matchers::{body_string_contains, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client_for(server: &MockServer) -> EwsClient<HttpTransport> {
    let endpoint = Url::parse(&server.uri()).expect("mock server URI should parse");
    EwsClient::new(endpoint, HttpTransport::new())
}

fn xml_response(body: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_raw(body.to_string(), "text/xml; charset=utf-8")
}

#[tokio::test]
async fn batch_delete_returns_per_item_results_in_submission_order() {
    let server = MockServer::start().await;

    let response = r#"<?xml version="1.0" encoding="utf-8"?>
        <s:Envelope xmlns:s="http://schemas.xmlsoap.org/soap/envelope/">
          <s:Body>
            <m:DeleteItemResponse xmlns:m="http://schemas.microsoft.com/exchange/services/2006/messages">
              <m:ResponseMessages>
                <m:DeleteItemResponseMessage ResponseClass="Success">
                  <m:ResponseCode>NoError</m:ResponseCode>
                </m:DeleteItemResponseMessage>
                <m:DeleteItemResponseMessage ResponseClass="Error">
                  <m:MessageText>The specified object was not found in the store.</m:MessageText>
                  <m:ResponseCode>ErrorItemNotFound</m:ResponseCode>
                </m:DeleteItemResponseMessage>
                <m:DeleteItemResponseMessage ResponseClass="Success">
                  <m:ResponseCode>NoError</m:ResponseCode>
                </m:DeleteItemResponseMessage>
              </m:ResponseMessages>
            </m:DeleteItemResponse>
          </s:Body>
        </s:Envelope>"#;

    Mock::given(method("POST"))
        .and(body_string_contains("DeleteItem"))
        .respond_with(xml_response(response))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let item_ids = vec![
        ItemId::new("AAMkAA=="),
        ItemId::new("AAMkAB=="),
        ItemId::new("AAMkAC=="),
    ];

    let results = client
        .delete_items(DeleteType::HardDelete, &item_ids)
        .await
        .expect("the batch itself should succeed");

    assert_eq!(results.len(), 3, "one result per submitted identifier");
    assert!(results[0].is_ok());
    assert!(results[2].is_ok());

    let failure = results[1].as_ref().expect_err("second item should fail");
    assert_eq!(failure.response_code.as_deref(), Some("ErrorItemNotFound"));
}

#[tokio::test]
async fn deleting_a_single_item_returns_a_single_result() {
    let server = MockServer::start().await;

    let response = r#"<?xml version="1.0" encoding="utf-8"?>
        <s:Envelope xmlns:s="http://schemas.xmlsoap.org/soap/envelope/">
          <s:Body>
            <m:DeleteItemResponse xmlns:m="http://schemas.microsoft.com/exchange/services/2006/messages">
              <m:ResponseMessages>
                <m:DeleteItemResponseMessage ResponseClass="Success">
                  <m:ResponseCode>NoError</m:ResponseCode>
                </m:DeleteItemResponseMessage>
              </m:ResponseMessages>
            </m:DeleteItemResponse>
          </s:Body>
        </s:Envelope>"#;

    Mock::given(method("POST"))
        .and(body_string_contains("DeleteItem"))
        .respond_with(xml_response(response))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let results = client
        .delete_items(DeleteType::HardDelete, &[ItemId::new("AAMkAA==")])
        .await
        .expect("the batch itself should succeed");

    assert_eq!(results.len(), 1);
    assert!(results[0].is_ok());
}

#[tokio::test]
async fn batch_just_below_the_chunk_boundary_keeps_submission_order() {
    let server = MockServer::start().await;

    // Every odd identifier fails; the even ones succeed.
    let delete_messages: String = (0..9)
        .map(|index| {
            if index % 2 == 1 {
                r#"<m:DeleteItemResponseMessage ResponseClass="Error">
                     <m:MessageText>The specified object was not found in the store.</m:MessageText>
                     <m:ResponseCode>ErrorItemNotFound</m:ResponseCode>
                   </m:DeleteItemResponseMessage>"#
            } else {
                r#"<m:DeleteItemResponseMessage ResponseClass="Success">
                     <m:ResponseCode>NoError</m:ResponseCode>
                   </m:DeleteItemResponseMessage>"#
            }
        })
        .collect();

    let response = format!(
        r#"<?xml version="1.0" encoding="utf-8"?>
        <s:Envelope xmlns:s="http://schemas.xmlsoap.org/soap/envelope/">
          <s:Body>
            <m:DeleteItemResponse xmlns:m="http://schemas.microsoft.com/exchange/services/2006/messages">
              <m:ResponseMessages>{delete_messages}</m:ResponseMessages>
            </m:DeleteItemResponse>
          </s:Body>
        </s:Envelope>"#
    );

    Mock::given(method("POST"))
        .and(body_string_contains("DeleteItem"))
        .respond_with(xml_response(&response))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let item_ids: Vec<_> = (0..9)
        .map(|index| ItemId::new(format!("AAMkAE{index}==")))
        .collect();

    let results = client
        .delete_items(DeleteType::HardDelete, &item_ids)
        .await
        .expect("the batch itself should succeed");

    assert_eq!(results.len(), 9, "one result per submitted identifier");
    for (index, result) in results.iter().enumerate() {
        assert_eq!(
            result.is_err(),
            index % 2 == 1,
            "result {index} should line up with its submitted identifier"
        );
    }
}

#[tokio::test]
async fn listing_pages_until_the_last_item_is_in_range() {
    let server = MockServer::start().await;

    let page_one = r#"<?xml version="1.0" encoding="utf-8"?>
        <s:Envelope xmlns:s="http://schemas.xmlsoap.org/soap/envelope/">
          <s:Body>
            <m:FindItemResponse xmlns:m="http://schemas.microsoft.com/exchange/services/2006/messages"
                                xmlns:t="http://schemas.microsoft.com/exchange/services/2006/types">
              <m:ResponseMessages>
                <m:FindItemResponseMessage ResponseClass="Success">
                  <m:ResponseCode>NoError</m:ResponseCode>
                  <m:RootFolder IndexedPagingOffset="2" TotalItemsInView="3" IncludesLastItemInRange="false">
                    <t:Items>
                      <t:Message><t:ItemId Id="AAMkAA==" ChangeKey="CQAAAA=="/></t:Message>
                      <t:Message><t:ItemId Id="AAMkAB==" ChangeKey="CQAAAB=="/></t:Message>
                    </t:Items>
                  </m:RootFolder>
                </m:FindItemResponseMessage>
              </m:ResponseMessages>
            </m:FindItemResponse>
          </s:Body>
        </s:Envelope>"#;

    let page_two = r#"<?xml version="1.0" encoding="utf-8"?>
        <s:Envelope xmlns:s="http://schemas.xmlsoap.org/soap/envelope/">
          <s:Body>
            <m:FindItemResponse xmlns:m="http://schemas.microsoft.com/exchange/services/2006/messages"
                                xmlns:t="http://schemas.microsoft.com/exchange/services/2006/types">
              <m:ResponseMessages>
                <m:FindItemResponseMessage ResponseClass="Success">
                  <m:ResponseCode>NoError</m:ResponseCode>
                  <m:RootFolder TotalItemsInView="3" IncludesLastItemInRange="true">
                    <t:Items>
                      <t:Message><t:ItemId Id="AAMkAC==" ChangeKey="CQAAAC=="/></t:Message>
                    </t:Items>
                  </m:RootFolder>
                </m:FindItemResponseMessage>
              </m:ResponseMessages>
            </m:FindItemResponse>
          </s:Body>
        </s:Envelope>"#;

    Mock::given(method("POST"))
        .and(body_string_contains(r#"Offset="0""#))
        .respond_with(xml_response(page_one))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(body_string_contains(r#"Offset="2""#))
        .respond_with(xml_response(page_two))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let records = client
        .list_folder_items(
            BaseFolderId::FolderId {
                id: "AQMkAA==".to_string(),
                change_key: None,
            },
            2,
        )
        .await
        .expect("listing should succeed");

    let ids: Vec<_> = records
        .iter()
        .map(|record| record.item_id.id.as_str())
        .collect();
    assert_eq!(
        ids,
        vec!["AAMkAA==", "AAMkAB==", "AAMkAC=="],
        "pages should accumulate in order without duplicates or gaps"
    );
}

#[tokio::test]
async fn server_busy_fault_is_retried_after_the_requested_delay() {
    let server = MockServer::start().await;

    let busy_fault = r#"<?xml version="1.0" encoding="utf-8"?>
        <s:Envelope xmlns:s="http://schemas.xmlsoap.org/soap/envelope/">
          <s:Body>
            <s:Fault>
              <faultcode>s:Server</faultcode>
              <faultstring>The server cannot service this request right now. Try again later.</faultstring>
              <detail>
                <e:ResponseCode xmlns:e="http://schemas.microsoft.com/exchange/services/2006/errors">ErrorServerBusy</e:ResponseCode>
                <e:Message xmlns:e="http://schemas.microsoft.com/exchange/services/2006/errors">The server cannot service this request right now.</e:Message>
                <t:MessageXml xmlns:t="http://schemas.microsoft.com/exchange/services/2006/types">
                  <t:Value Name="BackOffMilliseconds">25</t:Value>
                </t:MessageXml>
              </detail>
            </s:Fault>
          </s:Body>
        </s:Envelope>"#;

    let unsubscribed = r#"<?xml version="1.0" encoding="utf-8"?>
        <s:Envelope xmlns:s="http://schemas.xmlsoap.org/soap/envelope/">
          <s:Body>
            <m:UnsubscribeResponse xmlns:m="http://schemas.microsoft.com/exchange/services/2006/messages">
              <m:ResponseMessages>
                <m:UnsubscribeResponseMessage ResponseClass="Success">
                  <m:ResponseCode>NoError</m:ResponseCode>
                </m:UnsubscribeResponseMessage>
              </m:ResponseMessages>
            </m:UnsubscribeResponse>
          </s:Body>
        </s:Envelope>"#;

    // The first attempt is throttled; the retry succeeds.
    Mock::given(method("POST"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(500).set_body_raw(busy_fault, "text/xml; charset=utf-8"))
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/"))
        .respond_with(xml_response(unsubscribed))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    client
        .unsubscribe("HQB3YW0=".to_string())
        .await
        .expect("the request should succeed after backing off");
}

#[tokio::test]
async fn detail_fetches_are_batched() {
    let server = MockServer::start().await;

    // One response message with one item per submitted identifier, ten per
    // request.
    let item_messages: String = (0..10)
        .map(|index| {
            format!(
                r#"<m:GetItemResponseMessage ResponseClass="Success">
                     <m:ResponseCode>NoError</m:ResponseCode>
                     <m:Items><t:Message><t:ItemId Id="AAMkA{index}=" ChangeKey="CQAAAA=="/></t:Message></m:Items>
                   </m:GetItemResponseMessage>"#
            )
        })
        .collect();

    let response = format!(
        r#"<?xml version="1.0" encoding="utf-8"?>
        <s:Envelope xmlns:s="http://schemas.xmlsoap.org/soap/envelope/">
          <s:Body>
            <m:GetItemResponse xmlns:m="http://schemas.microsoft.com/exchange/services/2006/messages"
                               xmlns:t="http://schemas.microsoft.com/exchange/services/2006/types">
              <m:ResponseMessages>{item_messages}</m:ResponseMessages>
            </m:GetItemResponse>
          </s:Body>
        </s:Envelope>"#
    );

    Mock::given(method("POST"))
        .and(body_string_contains("GetItem"))
        .respond_with(xml_response(&response))
        .expect(2)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let item_ids: Vec<_> = (0..20)
        .map(|index| ItemId::new(format!("AAMkAD{index:02}==")))
        .collect();

    let items = client
        .get_items(
            &item_ids,
            &ItemShape {
                base_shape: BaseShape::Default,
                ..Default::default()
            },
        )
        .await
        .expect("batched fetch should succeed");

    // The mock's expect(2) verifies that twenty identifiers made exactly two
    // requests.
    assert_eq!(items.len(), 20);
}
