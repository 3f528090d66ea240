//! One-time bootstrap script injected into the host page
//!
//! The script installs the bridge object, seeds storage, reroutes speech
//! synthesis and `fetch` through the bridge, and finally loads the widget
//! library, reporting the outcome back over the message channel.

use super::action::BRIDGE_OBJECT;
use crate::config::WidgetConfig;
use crate::Result;
use serde::Serialize;

const TEMPLATE: &str = r#"(function () {
  if (__BRIDGE__) { return; }
  var config = __CONFIG__;
  var pending = {};
  var seq = 0;

  function log() {
    if (config.debug) {
      console.log.apply(console, ['[beaconBridge]'].concat([].slice.call(arguments)));
    }
  }

  function post(name, body) {
    window.ipc.postMessage(JSON.stringify({ name: name, body: body === undefined ? null : body }));
  }

  __BRIDGE__ = {
    orgId: config.orgId,
    user: config.user,
    metadata: config.metadata,
    closeBeaconBar: function () { post('closeBeaconBar', null); },
    resolveFetch: function (callbackId, payload) {
      var resolve = pending[callbackId];
      if (!resolve) { log('no pending fetch for', callbackId); return; }
      delete pending[callbackId];
      var data = JSON.parse(payload);
      var headers = data.headers || {};
      if (data.contentType && !headers['content-type']) { headers['content-type'] = data.contentType; }
      var noBody = data.status === 204 || data.status === 205 || data.status === 304;
      resolve(new Response(noBody ? null : data.body, { status: data.status, headers: headers }));
    }
  };

  function seed(store, values) {
    Object.keys(values).forEach(function (key) {
      try { store.setItem(key, values[key]); } catch (e) { log('storage seed failed', key, e); }
    });
  }
  seed(window.localStorage, config.storage.localStorage);
  seed(window.sessionStorage, config.storage.sessionStorage);
  Object.keys(config.storage.cookies).forEach(function (key) {
    document.cookie = encodeURIComponent(key) + '=' + encodeURIComponent(config.storage.cookies[key]) + '; path=/';
  });

  if (window.speechSynthesis) {
    window.speechSynthesis.speak = function (utterance) {
      post('speakText', utterance && utterance.text != null ? String(utterance.text) : null);
    };
    window.speechSynthesis.cancel = function () { post('speakCancel', null); };
    window.speechSynthesis.pause = function () { post('speakPause', null); };
    window.speechSynthesis.resume = function () { post('speakResume', null); };
  }

  window.fetch = function (input, init) {
    init = init || {};
    var raw = typeof input === 'string' ? input : (input && input.url) || String(input);
    var url;
    try { url = new URL(raw, window.location.href).href; } catch (e) { url = raw; }
    var headers = {};
    var source = init.headers || (input && input.headers);
    if (source) { new Headers(source).forEach(function (value, key) { headers[key] = value; }); }
    var request = {
      url: url,
      method: String(init.method || (input && input.method) || 'GET').toUpperCase(),
      headers: headers,
      body: init.body == null ? null : String(init.body)
    };
    return new Promise(function (resolve) {
      var callbackId = 'fetch_' + Date.now() + '_' + (++seq);
      pending[callbackId] = resolve;
      post('handleFetch', { request: JSON.stringify(request), callbackId: callbackId });
    });
  };

  var script = document.createElement('script');
  script.src = config.scriptUrl;
  script.async = true;
  script.onload = function () { post('onJsLibraryLoaded', config.scriptUrl); };
  script.onerror = function () { post('onJsLibraryLoadError', 'Failed to load ' + config.scriptUrl); };
  (document.head || document.documentElement).appendChild(script);
  log('bootstrap installed');
})();"#;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct BootstrapConfig<'a> {
    org_id: &'a str,
    user: &'a str,
    debug: bool,
    script_url: &'a str,
    metadata: Option<&'a serde_json::Value>,
    storage: &'a crate::config::StorageSeed,
}

/// Rendered bootstrap script for one widget configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BootstrapScript {
    source: String,
}

impl BootstrapScript {
    pub fn render(config: &WidgetConfig) -> Result<Self> {
        let payload = BootstrapConfig {
            org_id: &config.org_id,
            user: &config.user,
            debug: config.debug,
            script_url: config.script_url(),
            metadata: config.user_metadata.as_ref(),
            storage: &config.storage,
        };
        let json = serde_json::to_string(&payload)?;

        Ok(Self {
            source: TEMPLATE
                .replace("__BRIDGE__", BRIDGE_OBJECT)
                .replace("__CONFIG__", &json),
        })
    }

    pub fn source(&self) -> &str {
        &self.source
    }
}
