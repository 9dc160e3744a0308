//! Multi-region probe endpoints.

use std::sync::LazyLock;

use crate::types::ProbeEndpoint;

/// Probe URL → region label.
///
/// URLs and labels repeat on purpose (the same check is run at several
/// nominal regions); every row is probed and reported separately.
const CDN_NODES: &[(&str, &str)] = &[
    ("https://ips-app-nnrrjaztiz.cn-qingdao.fcapp.run", "中国-青岛"),
    ("https://ips-app-vrdhcyxprn.ap-southeast-5.fcapp.run", "新加坡"),
    ("https://ips-app-vrdhcyxprn.eu-west-1.fcapp.run", "欧洲-伦敦"),
    ("https://ips-app-vrdhcyxprn.eu-central-1.fcapp.run", "欧洲-法兰克福"),
    ("https://ips-app-vrdhcyxprn.ap-southeast-7.fcapp.run", "印度尼西亚-雅加达"),
    ("https://ips-app-vrdhcyxprn.ap-southeast-1.fcapp.run", "印度尼西亚-雅加达"),
    ("https://ips-app-vrdhcyxprn.ap-southeast-3.fcapp.run", "印度尼西亚-雅加达"),
    ("https://ips-app-nnrrqmtriz.cn-shenzhen.fcapp.run", "中国-深圳"),
    ("https://ips-app-vrdhcyxprn.cn-chengdu.fcapp.run", "中国-成都"),
    ("https://ips-app-nnrrjaztiz.cn-hangzhou.fcapp.run", "中国-杭州"),
    ("https://ips-app-vrdhcyxprn.cn-zhangjiakou.fcapp.run", "中国-张家口"),
    ("https://ips-app-vrdhcyxprn.ap-northeast-2.fcapp.run", "韩国-首尔"),
    ("https://ips-app-nnrrjaztiz.cn-beijing.fcapp.run", "中国-北京"),
    ("https://ips-app-vrdhcyxprn.cn-huhehaote.fcapp.run", "中国-呼和浩特"),
    ("https://ips-app-nnrrjaztiz.cn-hongkong.fcapp.run", "中国-香港"),
    ("https://ips-app-nnrrjaztiz.cn-qingdao.fcapp.run", "中国-青岛"),
];

static REGISTRY: LazyLock<Vec<ProbeEndpoint>> = LazyLock::new(|| {
    CDN_NODES
        .iter()
        .map(|(url, region)| ProbeEndpoint::new(*url, *region))
        .collect()
});

/// The built-in probe endpoints, in report order.
pub fn cdn_nodes() -> &'static [ProbeEndpoint] {
    &REGISTRY
}
